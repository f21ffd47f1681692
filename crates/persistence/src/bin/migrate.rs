#![deny(warnings)]

use persistence::{default_sqlite_url, GameStore, SqliteStore, DEFAULT_LEADERBOARD_SIZE};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| default_sqlite_url().to_string());
    // Ensure directory exists
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .filter(|p| !p.starts_with(":memory:"));
    if let Some(path) = path {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let store = SqliteStore::connect(&url).await?;
    let saves = store.leaderboard(DEFAULT_LEADERBOARD_SIZE).await?.len();
    println!("DB migrated at {url} ({saves} saves on the leaderboard)");
    Ok(())
}
