use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tycoon_core::GameState;

use crate::{GameStore, LeaderboardEntry, StoreError};

#[derive(Clone, Debug)]
struct Record {
    username: String,
    money: i64,
    day: u32,
    stats: tycoon_core::Stats,
    state_json: String,
}

/// In-process store for tests and offline sessions. Saves can be made to
/// fail to exercise the host's fallback path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Record>>,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `save` fail with [`StoreError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.fail_saves.store(failing, Ordering::SeqCst);
    }

    /// Put a raw document in place, well-formed or not.
    pub async fn insert_raw(&self, user_id: &str, state_json: &str) {
        self.records.lock().await.insert(
            user_id.to_string(),
            Record {
                username: user_id.to_string(),
                money: 0,
                day: 1,
                stats: Default::default(),
                state_json: state_json.to_string(),
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn load(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .records
            .lock()
            .await
            .get(user_id)
            .map(|r| r.state_json.clone()))
    }

    async fn save(
        &self,
        user_id: &str,
        username: &str,
        state: &GameState,
    ) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("save rejected".into()));
        }
        let record = Record {
            username: username.to_string(),
            money: state.money,
            day: state.day,
            stats: state.stats.clone(),
            state_json: state.to_json()?,
        };
        self.records
            .lock()
            .await
            .insert(user_id.to_string(), record);
        Ok(())
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let records = self.records.lock().await;
        let mut rows: Vec<(&String, &Record)> = records.iter().collect();
        rows.sort_by(|a, b| b.1.money.cmp(&a.1.money).then_with(|| a.0.cmp(b.0)));
        Ok(rows
            .into_iter()
            .take(limit)
            .map(|(_, r)| LeaderboardEntry {
                username: r.username.clone(),
                money: r.money,
                day: r.day,
                stats: r.stats.clone(),
            })
            .collect())
    }
}
