//! Special-event lifecycle: eligible, active, then completed or expired.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use tracing::{debug, info};
use tycoon_core::{
    GameState, NotificationKind, ProgressMetric, Reward, RewardToken, SpecialEvent,
    SpecialEventDef,
};

use crate::{inform, refuse, Engine};

fn millis(now: DateTime<Utc>) -> u64 {
    u64::try_from(now.timestamp_millis()).unwrap_or(0)
}

fn activate(state: &mut GameState, def: &SpecialEventDef, stamp: u64) {
    state.active_special_events.push(SpecialEvent {
        definition: def.clone(),
        start_day: state.day,
        end_day: state.day.saturating_add(def.duration),
        progress: Default::default(),
        completed_day: None,
        completed_at: None,
    });
    debug!(event = %def.id, day = state.day, "special event started");
    state.notify(
        NotificationKind::Success,
        format!(
            "Special Event Started: {}! Complete the challenge for unique rewards.",
            def.name
        ),
        stamp,
    );
}

/// Whether every declared requirement of the event holds right now.
fn requirements_met(state: &GameState, event: &SpecialEvent) -> bool {
    let req = &event.definition.requirements;
    let counts = req.business_count.as_ref().map_or(true, |bc| {
        bc.thresholds()
            .iter()
            .all(|t| state.count_of_type(&t.business_type) >= t.count)
    });
    counts && event.progress.meets(req)
}

/// Add to one counter of an active event. Unknown or inactive ids are ignored.
pub(crate) fn update_progress(
    state: &mut GameState,
    event_id: &str,
    metric: ProgressMetric,
    amount: u64,
) {
    if let Some(event) = state
        .active_special_events
        .iter_mut()
        .find(|e| e.id() == event_id)
    {
        event.progress.add(metric, amount);
    }
}

/// Move an active event to the completed list and grant its rewards.
/// Returns `false` when the event is not active.
pub(crate) fn complete(state: &mut GameState, event_id: &str, now: DateTime<Utc>) -> bool {
    let Some(index) = state
        .active_special_events
        .iter()
        .position(|e| e.id() == event_id)
    else {
        return false;
    };
    let stamp = millis(now);
    let mut event = state.active_special_events.remove(index);

    for reward in &event.definition.rewards {
        match reward {
            Reward::Money { value, .. } => state.money = state.money.saturating_add(*value),
            Reward::Experience { value, .. } => {
                state.experience = state.experience.saturating_add(*value)
            }
            Reward::Upgrade { id, description }
            | Reward::Staff { id, description }
            | Reward::SpecialBusiness { id, description } => {
                let reward_type = match reward {
                    Reward::Upgrade { .. } => "upgrade",
                    Reward::Staff { .. } => "staff",
                    _ => "special_business",
                };
                state.special_event_rewards.push(RewardToken {
                    id: id.clone(),
                    reward_type: reward_type.to_string(),
                    description: description.clone(),
                    from_event: event.id().to_string(),
                    date_awarded: now.timestamp_millis(),
                });
            }
        }
    }

    state.notify(
        NotificationKind::Success,
        format!(
            "Congratulations! You completed the {} challenge!",
            event.name()
        ),
        stamp,
    );
    if !event.definition.rewards.is_empty() {
        let earned: Vec<&str> = event
            .definition
            .rewards
            .iter()
            .map(Reward::description)
            .collect();
        state.notify(
            NotificationKind::Success,
            format!("Rewards earned: {}", earned.join(", ")),
            stamp,
        );
    }

    event.progress.completed = true;
    event.completed_day = Some(state.day);
    event.completed_at = Some(now.timestamp_millis());
    info!(event = %event.id(), day = state.day, "special event completed");
    state.completed_special_events.push(event);
    true
}

impl Engine {
    pub(crate) fn start_special_event(&self, state: &mut GameState, event_id: &str, stamp: u64) {
        let Some(def) = self.catalog.special_event(event_id) else {
            refuse(state, stamp, "START_SPECIAL_EVENT", "Event not found!");
            return;
        };
        if state.active_special_event(event_id).is_some() {
            inform(state, stamp, format!("{} is already active!", def.name));
            return;
        }
        activate(state, def, stamp);
    }

    /// Complete every active event whose requirements hold, then expire the
    /// ones past their last day. With nothing to do the state is untouched.
    pub(crate) fn check_special_events(&self, state: &mut GameState, now: DateTime<Utc>) {
        let day = state.day;
        let mut completed = Vec::new();
        let mut expired = Vec::new();
        for event in &state.active_special_events {
            if day > event.end_day {
                expired.push(event.id().to_string());
            } else if requirements_met(state, event) {
                completed.push(event.id().to_string());
            }
        }
        for id in &completed {
            complete(state, id, now);
        }
        let stamp = millis(now);
        for id in &expired {
            let Some(index) = state
                .active_special_events
                .iter()
                .position(|e| e.id() == id)
            else {
                continue;
            };
            let event = state.active_special_events.remove(index);
            inform(
                state,
                stamp,
                format!(
                    "The {} special event has ended without completion.",
                    event.name()
                ),
            );
        }
    }

    /// Start every event scheduled for the current calendar month that is
    /// neither active nor already completed this calendar year.
    pub(crate) fn trigger_seasonal_events(&self, state: &mut GameState, now: DateTime<Utc>) {
        let stamp = millis(now);
        let (month, year) = (now.month(), now.year());
        for def in &self.catalog.special_events {
            if def.seasonal_timing.map(|t| t.month) != Some(month) {
                continue;
            }
            if state.active_special_event(&def.id).is_some() {
                continue;
            }
            let done_this_year = state.completed_special_events.iter().any(|e| {
                e.id() == def.id
                    && e
                        .completed_at
                        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                        .is_some_and(|at| at.year() == year)
            });
            if done_this_year {
                continue;
            }
            activate(state, def, stamp);
        }
    }
}
