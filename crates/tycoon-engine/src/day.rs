//! The daily tick.

use rand::{Rng, RngCore};
use tracing::{debug, info};
use tycoon_core::{GameState, MarketEvent, NotificationKind};
use tycoon_econ::{daily_experience, is_bankrupt, net_worth, roll_market_event, Progression};

use crate::{instance_id, Engine, Env};

const BANKRUPTCY_MESSAGE: &str =
    "GAME OVER: You are bankrupt! Your net worth has fallen below zero.";

impl Engine {
    pub(crate) fn advance_day<R: RngCore>(&self, state: &mut GameState, env: &mut Env<R>) {
        if state.game_over {
            state.day = state.day.saturating_add(1);
            return;
        }
        let stamp = env.stamp();
        state
            .notifications
            .retain(|n| n.kind == NotificationKind::Error);

        let salaries = state
            .staff
            .iter()
            .fold(0i64, |acc, s| acc.saturating_add(s.salary));
        state.money = state.money.saturating_sub(salaries);
        state.stats.total_expenses = state.stats.total_expenses.saturating_add(salaries);

        age_market_events(&mut state.market_events);

        let roll: f64 = env.rng.gen();
        if let Some(kind) = roll_market_event(&self.catalog.market_events, roll) {
            let id = instance_id(&kind.id, stamp, |id| {
                state.market_events.iter().any(|e| e.id == id)
            });
            state.market_events.push(MarketEvent {
                id,
                event_type: kind.id.clone(),
                name: kind.name.clone(),
                effect: kind.effect.clone(),
                active: true,
                remaining_days: kind.effect.duration.unwrap_or(1),
                started_at: state.day,
            });
            state.notify(
                NotificationKind::Info,
                format!("Market Event: {}! {}", kind.name, kind.description),
                stamp,
            );
        }

        let gained = daily_experience(state.businesses.len());
        let before = state.level;
        let p = Progression {
            level: state.level,
            experience: state.experience.saturating_add(gained),
            experience_to_next_level: state.experience_to_next_level,
        }
        .settle();
        state.level = p.level;
        state.experience = p.experience;
        state.experience_to_next_level = p.experience_to_next_level;
        if p.level > before {
            state.notify(
                NotificationKind::Success,
                format!("Level up! You are now level {}!", p.level),
                stamp,
            );
        }

        state.stats.net_worth = net_worth(&self.catalog, state.money, &state.businesses);
        if is_bankrupt(state.stats.net_worth, state.money, state.businesses.len()) {
            info!(day = state.day, net_worth = state.stats.net_worth, "bankrupt");
            state.game_over = true;
            state.market_events.clear();
            state.notifications.clear();
            state.notify(NotificationKind::Error, BANKRUPTCY_MESSAGE, stamp);
        }

        state.day = state.day.saturating_add(1);
        debug!(
            day = state.day,
            money = state.money,
            net_worth = state.stats.net_worth,
            roll,
            "day advanced"
        );
    }
}

/// Drop events that ended on an earlier tick, then count the rest down.
/// An event whose last day just passed stays listed, inactive, until the
/// next tick.
fn age_market_events(events: &mut Vec<MarketEvent>) {
    events.retain(|e| e.active || e.remaining_days > 0);
    for e in events.iter_mut().filter(|e| e.active) {
        e.remaining_days = e.remaining_days.saturating_sub(1);
        e.active = e.remaining_days > 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use crate::Action;
    use proptest::prelude::*;

    fn tick(state: &GameState, roll: f64) -> GameState {
        let mut env = Env::new(november(), fixed_roll(roll));
        engine().transition(state, &Action::AdvanceDay, &mut env)
    }

    #[test]
    fn salary_is_charged_each_day() {
        let engine = engine();
        let s = run(
            &engine,
            &GameState::fresh(true),
            &[
                Action::PurchaseBusiness {
                    business_type: "coffee_shop".into(),
                },
                Action::HireStaff {
                    staff_type: "manager".into(),
                },
            ],
        );
        assert_eq!(s.money, 2_000);
        let s = run(&engine, &s, &[Action::AdvanceDay]);
        assert_eq!(s.money, 1_000);
        assert_eq!(s.stats.total_expenses, 4_000);
        assert_eq!(s.stats.net_worth, 6_000);
    }

    #[test]
    fn bankruptcy_without_businesses() {
        let mut s0 = GameState::fresh(true);
        s0.money = -1;
        s0.notify(NotificationKind::Info, "stale", 1);
        let s = tick(&s0, 0.05);
        assert!(s.game_over);
        assert!(s.market_events.is_empty());
        assert_eq!(s.notifications.len(), 1);
        assert_eq!(s.notifications[0].message, BANKRUPTCY_MESSAGE);
        assert_eq!(s.day, 2);
        let worth = net_worth(engine().catalog(), s.money, &s.businesses);
        assert!(is_bankrupt(worth, s.money, s.businesses.len()));
    }

    #[test]
    fn game_over_day_only_counts_up() {
        let mut s0 = GameState::fresh(true);
        s0.game_over = true;
        s0.money = -5;
        let s = tick(&s0, 0.01);
        assert_eq!(s.day, 2);
        assert_eq!(s.money, -5);
        assert!(s.market_events.is_empty());
    }

    #[test]
    fn experience_only_with_businesses() {
        let engine = engine();
        let s = run(&engine, &GameState::fresh(true), &[Action::AdvanceDay]);
        assert_eq!(s.experience, 0);

        let mut s0 = GameState::fresh(true);
        s0.experience = 900;
        let s = run(
            &engine,
            &s0,
            &[
                Action::PurchaseBusiness {
                    business_type: "coffee_shop".into(),
                },
                Action::AdvanceDay,
            ],
        );
        assert_eq!(s.level, 2);
        assert_eq!(s.experience, 50);
        assert_eq!(s.experience_to_next_level, 1_500);
    }

    #[test]
    fn market_roll_picks_first_matching_entry() {
        let s0 = GameState::fresh(true);
        let cases = [
            (0.05, Some("economic_boom")),
            (0.12, Some("tax_cut")),
            (0.19, Some("new_trend")),
            (0.5, None),
        ];
        for (roll, expected) in cases {
            let s = tick(&s0, roll);
            let got = s.market_events.first().map(|e| e.event_type.as_str());
            assert_eq!(got, expected, "roll {roll}");
        }
    }

    #[test]
    fn market_events_expire_then_drop() {
        let mut s = tick(&GameState::fresh(true), 0.19);
        let duration = s.market_events[0].remaining_days;
        assert!(s.market_events[0].active);
        for _ in 0..duration {
            s = tick(&s, 0.9);
        }
        assert_eq!(s.market_events.len(), 1);
        assert!(!s.market_events[0].active);
        assert_eq!(s.market_events[0].remaining_days, 0);
        s = tick(&s, 0.9);
        assert!(s.market_events.is_empty());
    }

    #[test]
    fn active_market_event_boosts_revenue() {
        let engine = engine();
        let s = run(
            &engine,
            &GameState::fresh(true),
            &[Action::PurchaseBusiness {
                business_type: "coffee_shop".into(),
            }],
        );
        let s = tick(&s, 0.05);
        let boom = engine.catalog().market_event("economic_boom").unwrap();
        let id = s.businesses[0].id.clone();
        let s = run(&engine, &s, &[Action::CollectRevenue { business_id: id }]);
        let expected = tycoon_econ::collected_revenue(
            500,
            1,
            rust_decimal::Decimal::ONE + boom.effect.value,
        );
        assert_eq!(s.stats.total_revenue, expected);
    }

    #[test]
    fn lapsed_market_event_no_longer_boosts_revenue() {
        let engine = engine();
        let s = run(
            &engine,
            &GameState::fresh(true),
            &[Action::PurchaseBusiness {
                business_type: "coffee_shop".into(),
            }],
        );
        let mut s = tick(&s, 0.05);
        let duration = s.market_events[0].remaining_days;
        for _ in 0..duration {
            s = tick(&s, 0.9);
        }
        assert_eq!(s.market_events.len(), 1);
        assert!(!s.market_events[0].active);

        let id = s.businesses[0].id.clone();
        let s = run(&engine, &s, &[Action::CollectRevenue { business_id: id }]);
        let expected = tycoon_econ::collected_revenue(500, 1, rust_decimal::Decimal::ONE);
        assert_eq!(s.stats.total_revenue, expected);
    }

    #[test]
    fn huge_loaded_salaries_saturate() {
        let engine = engine();
        let mut s = GameState::fresh(true);
        let manager = engine.catalog().staff_type("manager").unwrap();
        for n in 0..2 {
            s.staff.push(tycoon_core::Staff {
                id: format!("manager_{n}"),
                staff_type: "manager".into(),
                salary: i64::MAX,
                effect: manager.effect.clone(),
            });
        }
        let s = tick(&s, 0.9);
        assert_eq!(s.stats.total_expenses, i64::MAX);
        assert!(s.game_over);
        assert_eq!(s.day, 2);
    }

    #[test]
    fn errors_survive_the_tick() {
        let mut s0 = GameState::fresh(true);
        s0.notify(NotificationKind::Error, "keep", 1);
        s0.notify(NotificationKind::Success, "drop", 2);
        let s = tick(&s0, 0.9);
        assert_eq!(s.notifications.len(), 1);
        assert_eq!(s.notifications[0].message, "keep");
    }

    proptest! {
        #[test]
        fn day_always_advances_by_one(money in -100_000i64..100_000, over in any::<bool>(), roll in 0.0f64..1.0) {
            let mut s0 = GameState::fresh(true);
            s0.money = money;
            s0.game_over = over;
            let s = tick(&s0, roll);
            prop_assert_eq!(s.day, s0.day + 1);
        }

        #[test]
        fn at_most_one_new_market_event_per_day(roll in 0.0f64..1.0) {
            let s = tick(&GameState::fresh(true), roll);
            prop_assert!(s.market_events.len() <= 1);
        }
    }
}
