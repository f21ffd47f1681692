//! One player's session: the live state, its store and its timers.

use std::sync::Arc;
use std::time::Duration;

use persistence::{GameStore, LeaderboardEntry, LocalCache, StoreError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tycoon_core::{GameState, NotificationKind, ProgressMetric};
use tycoon_engine::{Action, Engine, Env};

use crate::{Clock, Schedule, SessionConfig, SessionError};

const WELCOME: &str = "Welcome to Business Tycoon! Start by purchasing your first business.";

/// What a call to [`Session::poll`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PollOutcome {
    pub autosaved: bool,
    pub checked_events: bool,
    pub triggered_seasonal: bool,
}

pub struct Session {
    engine: Engine,
    state: GameState,
    env: Env,
    store: Arc<dyn GameStore>,
    cache: LocalCache,
    clock: Arc<dyn Clock>,
    schedule: Schedule,
    user_id: String,
    username: String,
    pending: Vec<JoinHandle<()>>,
}

impl Session {
    pub fn new(
        config: &SessionConfig,
        store: Arc<dyn GameStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let engine = Engine::standard(config.engine.clone())?;
        let now = clock.now();
        Ok(Self {
            state: engine.fresh_state(),
            engine,
            env: Env::seeded(config.rng_seed, now),
            store,
            cache: LocalCache::new(&config.cache_dir),
            schedule: Schedule::new(
                Duration::from_secs(config.autosave_secs),
                Duration::from_secs(config.event_check_secs),
                now,
            ),
            clock,
            user_id: config.user_id.clone(),
            username: config.username.clone(),
            pending: Vec::new(),
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Load the player's game: the store first, then the local cache, then a
    /// fresh game with a welcome message.
    pub async fn start(&mut self) {
        match self.cache.tutorial_disabled().await {
            Ok(true) => self.engine.set_tutorial_disabled(true),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "could not read tutorial preference"),
        }

        match self.store.load(&self.user_id).await {
            Ok(Some(json)) => match GameState::from_json(&json) {
                Ok(saved) => {
                    self.apply(&Action::LoadSavedGame(Box::new(saved)));
                    if self.state.initialized {
                        info!(user = %self.user_id, day = self.state.day, "game loaded");
                        return;
                    }
                }
                Err(e) => warn!(error = %e, "stored game is malformed"),
            },
            Ok(None) => debug!(user = %self.user_id, "no stored game"),
            Err(e) => warn!(error = %e, "load failed; trying local cache"),
        }

        let cached = match self.cache.load(&self.user_id).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(error = %e, "local cache unreadable");
                None
            }
        };
        let found = cached.is_some();
        self.apply(&Action::InitializeGame { saved: cached });
        if !found {
            self.apply(&Action::AddNotification {
                kind: NotificationKind::Info,
                message: WELCOME.into(),
            });
        }
        info!(user = %self.user_id, from_cache = found, "session started");
    }

    /// Transition without any host side effects.
    fn apply(&mut self, action: &Action) {
        self.env.now = self.clock.now();
        self.state = self.engine.transition(&self.state, action, &mut self.env);
    }

    /// Apply a player action, feed special-event progress and schedule saves.
    pub async fn dispatch(&mut self, action: Action) -> &GameState {
        let before = self.state.clone();
        self.apply(&action);

        for (metric, amount) in progress_feed(&self.engine, &before, &self.state, &action) {
            let ids: Vec<String> = self
                .state
                .active_special_events
                .iter()
                .map(|e| e.id().to_string())
                .collect();
            for event_id in ids {
                self.apply(&Action::UpdateSpecialEventProgress {
                    event_id,
                    progress_type: metric,
                    amount,
                });
            }
        }

        match action {
            Action::AdvanceDay => self.spawn_save(),
            Action::PermanentlyDisableTutorial => {
                self.engine.set_tutorial_disabled(true);
                if let Err(e) = self.cache.set_tutorial_disabled(true).await {
                    warn!(error = %e, "could not persist tutorial preference");
                }
            }
            _ if self.state.game_over && !before.game_over => self.spawn_save(),
            _ => {}
        }
        &self.state
    }

    /// Save in the background; a failed save lands in the local cache.
    fn spawn_save(&mut self) {
        self.pending.retain(|h| !h.is_finished());
        let store = Arc::clone(&self.store);
        let cache = self.cache.clone();
        let user_id = self.user_id.clone();
        let username = self.username.clone();
        let state = self.state.clone();
        self.pending.push(tokio::spawn(async move {
            match store.save(&user_id, &username, &state).await {
                Ok(()) => debug!(user = %user_id, day = state.day, "background save done"),
                Err(e) => {
                    warn!(error = %e, "background save failed; caching locally");
                    if let Err(e) = cache.store(&user_id, &state).await {
                        warn!(error = %e, "local cache write failed");
                    }
                }
            }
        }));
    }

    /// Wait for every background save to finish.
    pub async fn flush(&mut self) {
        for handle in self.pending.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "background save task failed");
            }
        }
    }

    /// Save now and tell the player how it went.
    pub async fn save_now(&mut self) -> Result<(), SessionError> {
        let saved = self
            .store
            .save(&self.user_id, &self.username, &self.state)
            .await;
        match saved {
            Ok(()) => {
                self.apply(&Action::AddNotification {
                    kind: NotificationKind::Success,
                    message: "Game saved successfully!".into(),
                });
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "save failed; caching locally");
                let cached = self.cache.store(&self.user_id, &self.state).await;
                self.apply(&Action::AddNotification {
                    kind: NotificationKind::Error,
                    message: "Failed to save game. Your progress is kept locally.".into(),
                });
                cached?;
                Err(e.into())
            }
        }
    }

    /// Run whatever timers are due.
    pub fn poll(&mut self) -> PollOutcome {
        let now = self.clock.now();
        let mut outcome = PollOutcome::default();
        if self.schedule.autosave_due(now) {
            self.spawn_save();
            outcome.autosaved = true;
        }
        if !self.state.active_special_events.is_empty() && self.schedule.event_check_due(now) {
            self.apply(&Action::CheckSpecialEventsProgress);
            outcome.checked_events = true;
        }
        if self.schedule.seasonal_due(now) {
            self.apply(&Action::TriggerSeasonalEvents);
            outcome.triggered_seasonal = true;
        }
        outcome
    }

    /// Log out: discard the game and its local copy.
    pub async fn reset(&mut self) {
        self.apply(&Action::ResetGame);
        if let Err(e) = self.cache.clear(&self.user_id).await {
            warn!(error = %e, "could not clear local cache");
        }
    }

    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        self.store.leaderboard(limit).await
    }
}

/// Progress the host reports to active special events after an action.
fn progress_feed(
    engine: &Engine,
    before: &GameState,
    after: &GameState,
    action: &Action,
) -> Vec<(ProgressMetric, u64)> {
    let gained = |a: i64, b: i64| u64::try_from(b.saturating_sub(a)).unwrap_or(0);
    match action {
        Action::CollectRevenue { .. } | Action::CollectAllRevenue => {
            let revenue = gained(before.stats.total_revenue, after.stats.total_revenue);
            if revenue == 0 {
                return Vec::new();
            }
            vec![(ProgressMetric::Revenue, revenue)]
        }
        Action::PurchaseUpgrade { business_id, .. } => {
            let spent = gained(before.stats.total_expenses, after.stats.total_expenses);
            if spent == 0 {
                return Vec::new();
            }
            let green = after
                .business(business_id)
                .and_then(|b| engine.catalog().business(&b.business_type))
                .is_some_and(|kind| kind.green);
            let mut feed = vec![(ProgressMetric::Investment, spent)];
            if green {
                feed.push((ProgressMetric::GreenInvestment, spent));
            }
            feed
        }
        Action::HireStaff { .. } if after.staff.len() > before.staff.len() => {
            vec![(ProgressMetric::StaffHired, 1)]
        }
        _ => Vec::new(),
    }
}
