use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::{debug, info};
use tycoon_core::{GameState, Stats};

use crate::{GameStore, LeaderboardEntry, StoreError};

/// Open (creating if needed) the database at `url` and run migrations.
pub async fn init_db(url: &str) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    // Every in-memory connection is its own database.
    let max = if url.contains(":memory:") { 1 } else { 5 };
    let pool = SqlitePoolOptions::new()
        .max_connections(max)
        .connect_with(options)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!(url, "database ready");
    Ok(pool)
}

/// Saves in a SQLite table keyed by user id.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        Ok(Self::from_pool(init_db(url).await?))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl GameStore for SqliteStore {
    async fn load(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT state_json FROM game_states WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| r.try_get::<String, _>("state_json"))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn save(
        &self,
        user_id: &str,
        username: &str,
        state: &GameState,
    ) -> Result<(), StoreError> {
        let state_json = state.to_json()?;
        let stats_json = serde_json::to_string(&state.stats)?;
        sqlx::query(
            "INSERT INTO game_states (user_id, username, money, day, stats_json, state_json, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                username = excluded.username,
                money = excluded.money,
                day = excluded.day,
                stats_json = excluded.stats_json,
                state_json = excluded.state_json,
                updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(username)
        .bind(state.money)
        .bind(i64::from(state.day))
        .bind(stats_json)
        .bind(state_json)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        debug!(user_id, day = state.day, money = state.money, "game saved");
        Ok(())
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT username, money, day, stats_json FROM game_states
             ORDER BY money DESC, user_id ASC LIMIT ?",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|r| -> Result<LeaderboardEntry, StoreError> {
                let stats: Stats = serde_json::from_str(&r.try_get::<String, _>("stats_json")?)?;
                Ok(LeaderboardEntry {
                    username: r.try_get("username")?,
                    money: r.try_get("money")?,
                    day: u32::try_from(r.try_get::<i64, _>("day")?).unwrap_or(u32::MAX),
                    stats,
                })
            })
            .collect()
    }
}
