#![deny(warnings)]

//! Persistence layer: the save/load contract the session host talks to,
//! a SQLite store, an in-memory store and the local fallback cache.
//!
//! Stores hand back the raw saved document. Deciding whether a document is
//! well-formed is the engine's job, so a corrupt row never fails a load.

mod cache;
mod memory;
mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tycoon_core::{GameState, Stats};

pub use cache::LocalCache;
pub use memory::MemoryStore;
pub use sqlite::{init_db, SqliteStore};

/// Number of entries the leaderboard shows by default.
pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;

/// Returns the default SQLite URL used for local saves.
pub fn default_sqlite_url() -> &'static str {
    "sqlite://./saves/tycoon.db"
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The backing service refused or could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// One leaderboard row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub money: i64,
    pub day: u32,
    pub stats: Stats,
}

/// Save/load contract for one user's game.
///
/// `load` returns `Ok(None)` when the user has no save; that is the signal to
/// start fresh, not an error. Concurrent saves for one user are last-write-wins.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn load(&self, user_id: &str) -> Result<Option<String>, StoreError>;

    async fn save(&self, user_id: &str, username: &str, state: &GameState)
        -> Result<(), StoreError>;

    /// Top `limit` saves by money, richest first.
    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_is_sqlite() {
        assert!(default_sqlite_url().starts_with("sqlite://"));
    }

    #[test]
    fn leaderboard_entry_shape() {
        let entry = LeaderboardEntry {
            username: "ada".into(),
            money: 42,
            day: 3,
            stats: Stats::default(),
        };
        let v = serde_json::to_value(&entry).unwrap();
        assert_eq!(v["username"], "ada");
        assert_eq!(v["stats"]["netWorth"], 10_000);
    }
}
