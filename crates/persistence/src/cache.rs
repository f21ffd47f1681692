use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;
use tycoon_core::GameState;

use crate::StoreError;

const TUTORIAL_FLAG: &str = "tutorial_disabled";

/// Files on local disk: the fallback copy of each user's save and the
/// player's tutorial preference.
#[derive(Clone, Debug)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn save_path(&self, user_id: &str) -> PathBuf {
        let name: String = user_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.save.json"))
    }

    /// Write the fallback copy of a save.
    pub async fn store(&self, user_id: &str, state: &GameState) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.save_path(user_id);
        tokio::fs::write(&path, state.to_json()?).await?;
        debug!(path = %path.display(), "save cached locally");
        Ok(())
    }

    /// The cached document, if any. Its content is not checked here.
    pub async fn load(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        read_optional(&self.save_path(user_id)).await
    }

    pub async fn clear(&self, user_id: &str) -> Result<(), StoreError> {
        remove_optional(&self.save_path(user_id)).await
    }

    pub async fn tutorial_disabled(&self) -> Result<bool, StoreError> {
        Ok(read_optional(&self.dir.join(TUTORIAL_FLAG))
            .await?
            .is_some_and(|v| v.trim() == "true"))
    }

    pub async fn set_tutorial_disabled(&self, disabled: bool) -> Result<(), StoreError> {
        let path = self.dir.join(TUTORIAL_FLAG);
        if !disabled {
            return remove_optional(&path).await;
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(path, "true").await?;
        Ok(())
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn remove_optional(path: &Path) -> Result<(), StoreError> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}
