#![deny(warnings)]

//! Progression engine for Business Tycoon.
//!
//! [`Engine::transition`] maps `(state, action)` to the next state. It does
//! no I/O and reads no ambient state: wall-clock time and randomness arrive
//! through [`Env`], configuration through [`EngineConfig`]. Rule violations
//! never fail the call; they surface as notifications on the returned state.

pub mod action;
mod commerce;
mod day;
mod special;

use chrono::{DateTime, Utc};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tycoon_core::{validate_state, Catalog, CatalogError, GameState, NotificationKind};

pub use action::Action;

/// Engine switches supplied by the host at construction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Also refuse purchases above the player's level, a second staff member
    /// of one type and a repeated upgrade on one business.
    #[serde(default)]
    pub enforce_catalog_rules: bool,
    /// The player turned the tutorial off for good.
    #[serde(default)]
    pub tutorial_disabled: bool,
}

/// Wall-clock time and randomness for one transition.
pub struct Env<R = ChaCha8Rng> {
    pub now: DateTime<Utc>,
    pub rng: R,
}

impl Env<ChaCha8Rng> {
    /// Deterministic environment for a seed.
    pub fn seeded(seed: u64, now: DateTime<Utc>) -> Self {
        Self {
            now,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl<R: RngCore> Env<R> {
    pub fn new(now: DateTime<Utc>, rng: R) -> Self {
        Self { now, rng }
    }

    /// Millisecond timestamp used for instance and notification ids.
    pub fn stamp(&self) -> u64 {
        u64::try_from(self.now.timestamp_millis()).unwrap_or(0)
    }
}

/// The progression engine: a catalog plus configuration.
#[derive(Clone, Debug)]
pub struct Engine {
    catalog: Catalog,
    config: EngineConfig,
}

impl Engine {
    pub fn new(catalog: Catalog, config: EngineConfig) -> Self {
        Self { catalog, config }
    }

    /// Engine over the shipped catalog.
    pub fn standard(config: EngineConfig) -> Result<Self, CatalogError> {
        Ok(Self::new(Catalog::standard()?, config))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_tutorial_disabled(&mut self, disabled: bool) {
        self.config.tutorial_disabled = disabled;
    }

    /// A fresh game honouring the tutorial preference.
    pub fn fresh_state(&self) -> GameState {
        GameState::fresh(!self.config.tutorial_disabled)
    }

    /// Apply one action and return the next state. The input is untouched.
    pub fn transition<R: RngCore>(
        &self,
        state: &GameState,
        action: &Action,
        env: &mut Env<R>,
    ) -> GameState {
        let mut next = state.clone();
        self.apply(&mut next, action, env);
        next
    }

    fn apply<R: RngCore>(&self, state: &mut GameState, action: &Action, env: &mut Env<R>) {
        let stamp = env.stamp();
        if state.game_over && action.is_economic() {
            refuse(
                state,
                stamp,
                action.name(),
                "The game is over! Start a new game to keep playing.",
            );
            return;
        }
        match action {
            Action::InitializeGame { saved } => self.initialize(state, saved.as_deref()),
            Action::LoadSavedGame(saved) => self.load_saved(state, saved, env),
            Action::AddNotification { kind, message } => {
                state.notify(*kind, message.clone(), stamp)
            }
            Action::PurchaseBusiness { business_type } => {
                self.purchase_business(state, business_type, stamp)
            }
            Action::CollectRevenue { business_id } => {
                self.collect_revenue(state, business_id, stamp)
            }
            Action::CollectAllRevenue => self.collect_all_revenue(state, stamp),
            Action::HireStaff { staff_type } => self.hire_staff(state, staff_type, stamp),
            Action::PurchaseUpgrade {
                upgrade_type,
                business_id,
            } => self.purchase_upgrade(state, upgrade_type, business_id, stamp),
            Action::SellBusiness { business_id } => self.sell_business(state, business_id, stamp),
            Action::AdvanceDay => self.advance_day(state, env),
            Action::StartSpecialEvent { event_id } => {
                self.start_special_event(state, event_id, stamp);
            }
            Action::UpdateSpecialEventProgress {
                event_id,
                progress_type,
                amount,
            } => special::update_progress(state, event_id, *progress_type, *amount),
            Action::CheckSpecialEventsProgress => self.check_special_events(state, env.now),
            Action::TriggerSeasonalEvents => self.trigger_seasonal_events(state, env.now),
            Action::CompleteSpecialEvent { event_id } => {
                if !special::complete(state, event_id, env.now) {
                    refuse(
                        state,
                        stamp,
                        action.name(),
                        "Event not found or already completed!",
                    );
                }
            }
            Action::CloseTutorial | Action::PermanentlyDisableTutorial => {
                state.show_tutorial = false
            }
            Action::ClearNotification { notification_id } => {
                state.clear_notification(*notification_id)
            }
            Action::ClearAllNotifications => state.notifications.clear(),
            Action::ResetGame => *state = self.fresh_state(),
        }
    }

    fn initialize(&self, state: &mut GameState, saved: Option<&str>) {
        let loaded = saved.and_then(|json| match GameState::from_json(json) {
            Ok(s) => match validate_state(&s, &self.catalog) {
                Ok(()) => Some(s),
                Err(e) => {
                    warn!(error = %e, "saved game failed validation; starting fresh");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "saved game is malformed; starting fresh");
                None
            }
        });
        *state = loaded.unwrap_or_else(|| self.fresh_state());
        state.initialized = true;
    }

    fn load_saved<R: RngCore>(&self, state: &mut GameState, saved: &GameState, env: &mut Env<R>) {
        let stamp = env.stamp();
        if let Err(e) = validate_state(saved, &self.catalog) {
            refuse(
                state,
                stamp,
                "LOAD_SAVED_GAME",
                format!("Saved game could not be loaded: {e}"),
            );
            return;
        }
        let notifications = std::mem::take(&mut state.notifications);
        *state = saved.clone();
        state.notifications = notifications;
        state.initialized = true;
        // Ids must stay unique across reloads of the same save.
        for event in &mut state.market_events {
            let base = if event.event_type.is_empty() {
                event.id.clone()
            } else {
                event.event_type.clone()
            };
            event.id = format!("{base}_{stamp}_{:08x}", env.rng.next_u32());
        }
        state.notify(NotificationKind::Info, "Game loaded successfully!", stamp);
    }
}

/// Record a refused action as an error notification.
fn refuse(state: &mut GameState, stamp: u64, action: &str, message: impl Into<String>) {
    let message = message.into();
    debug!(action, %message, "action refused");
    state.notify(NotificationKind::Error, message, stamp);
}

/// Informational outcome that changes nothing else.
fn inform(state: &mut GameState, stamp: u64, message: impl Into<String>) {
    state.notify(NotificationKind::Info, message, stamp);
}

/// `{prefix}_{stamp}`, suffixed when that id is already taken.
fn instance_id(prefix: &str, stamp: u64, taken: impl Fn(&str) -> bool) -> String {
    let base = format!("{prefix}_{stamp}");
    if !taken(&base) {
        return base;
    }
    (2u32..)
        .map(|n| format!("{base}_{n}"))
        .find(|id| !taken(id))
        .unwrap_or(base)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::mock::StepRng;

    /// 2024-11-15 12:00 UTC.
    pub fn november() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 15, 12, 0, 0).unwrap()
    }

    /// An RNG whose every `f64` draw equals `roll` (to 53 bits).
    pub fn fixed_roll(roll: f64) -> StepRng {
        let bits = (roll * (1u64 << 53) as f64) as u64;
        StepRng::new(bits << 11, 0)
    }

    /// Environment in which no market event ever starts.
    pub fn quiet_env() -> Env<StepRng> {
        Env::new(november(), fixed_roll(0.999))
    }

    pub fn engine() -> Engine {
        Engine::standard(EngineConfig::default()).unwrap()
    }

    pub fn run(engine: &Engine, state: &GameState, actions: &[Action]) -> GameState {
        let mut env = quiet_env();
        actions
            .iter()
            .fold(state.clone(), |s, a| engine.transition(&s, a, &mut env))
    }

    pub fn last_kind(state: &GameState) -> NotificationKind {
        state.notifications.last().unwrap().kind
    }
}
