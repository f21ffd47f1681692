//! Session configuration, loaded from YAML.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tycoon_engine::EngineConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Invalid(e.to_string())
    }
}

/// Everything a session needs besides its store and clock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub user_id: String,
    pub username: String,
    pub rng_seed: u64,
    /// Seconds between background saves.
    pub autosave_secs: u64,
    /// Seconds between special-event progress checks.
    pub event_check_secs: u64,
    pub cache_dir: PathBuf,
    pub database_url: String,
    pub engine: EngineConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_id: "local".into(),
            username: "Player".into(),
            rng_seed: 42,
            autosave_secs: 300,
            event_check_secs: 60,
            cache_dir: PathBuf::from("./saves/cache"),
            database_url: persistence::default_sqlite_url().into(),
            engine: EngineConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let cfg: SessionConfig = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_yaml(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_id.trim().is_empty() {
            return Err(ConfigError::Invalid("userId must not be empty".into()));
        }
        if self.autosave_secs == 0 || self.event_check_secs == 0 {
            return Err(ConfigError::Invalid("intervals must be > 0".into()));
        }
        Ok(())
    }
}
