//! Stamps the CLI banner with the commit it was built from.

use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let out = Command::new("git").args(args).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let text = String::from_utf8(out.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn main() {
    let revision = git(&["rev-parse", "--short=10", "HEAD"]).unwrap_or_else(|| "dev".into());
    let committed = git(&["log", "-1", "--format=%cs"]).unwrap_or_else(|| "unreleased".into());
    println!("cargo:rustc-env=TYCOON_REVISION={revision}");
    println!("cargo:rustc-env=TYCOON_COMMIT_DATE={committed}");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
