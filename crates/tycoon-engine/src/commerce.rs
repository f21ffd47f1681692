//! Purchases, collection, hiring, upgrades and sales.

use tracing::debug;
use tycoon_core::{Business, GameState, NotificationKind, Staff, Upgrade};
use tycoon_econ::{business_revenue, hiring_cost, sell_value};

use crate::{inform, instance_id, refuse, Engine};

impl Engine {
    pub(crate) fn purchase_business(&self, state: &mut GameState, business_type: &str, stamp: u64) {
        let Some(kind) = self.catalog.business(business_type) else {
            refuse(state, stamp, "PURCHASE_BUSINESS", "Unknown business type!");
            return;
        };
        if self.config.enforce_catalog_rules && state.level < kind.unlock_level {
            refuse(
                state,
                stamp,
                "PURCHASE_BUSINESS",
                format!("Reach level {} to unlock {}!", kind.unlock_level, kind.name),
            );
            return;
        }
        if state.money < kind.base_price {
            refuse(
                state,
                stamp,
                "PURCHASE_BUSINESS",
                "Not enough money to purchase this business!",
            );
            return;
        }
        let id = instance_id(&kind.id, stamp, |id| state.business(id).is_some());
        state.money -= kind.base_price;
        state.businesses.push(Business {
            id,
            business_type: kind.id.clone(),
            level: 1,
            last_collected_day: state.day,
            purchased_on_day: state.day,
            upgrades: Vec::new(),
        });
        debug!(business = %kind.id, price = kind.base_price, "business purchased");
        state.notify(
            NotificationKind::Success,
            format!("Purchased a new {}!", kind.name),
            stamp,
        );
    }

    /// Revenue the business would yield right now.
    fn revenue_for(&self, state: &GameState, business: &Business) -> i64 {
        business_revenue(
            &self.catalog,
            business,
            state.staff.iter().map(|s| &s.effect),
            state
                .market_events
                .iter()
                .filter(|e| e.active)
                .map(|e| &e.effect),
        )
    }

    pub(crate) fn collect_revenue(&self, state: &mut GameState, business_id: &str, stamp: u64) {
        let Some(business) = state.business(business_id) else {
            refuse(state, stamp, "COLLECT_REVENUE", "Business not found!");
            return;
        };
        if business.purchased_on_day == state.day {
            refuse(
                state,
                stamp,
                "COLLECT_REVENUE",
                "This business was just purchased today! You can collect revenue starting tomorrow.",
            );
            return;
        }
        if business.last_collected_day == state.day {
            refuse(
                state,
                stamp,
                "COLLECT_REVENUE",
                "You've already collected revenue from this business today!",
            );
            return;
        }
        let revenue = self.revenue_for(state, business);
        let name = self
            .catalog
            .business(&business.business_type)
            .map_or_else(|| business.business_type.clone(), |k| k.name.clone());
        let day = state.day;
        if let Some(b) = state.business_mut(business_id) {
            b.last_collected_day = day;
        }
        state.money = state.money.saturating_add(revenue);
        state.stats.total_revenue = state.stats.total_revenue.saturating_add(revenue);
        inform(state, stamp, format!("Collected ${revenue} from {name}!"));
    }

    pub(crate) fn collect_all_revenue(&self, state: &mut GameState, stamp: u64) {
        let day = state.day;
        let view: &GameState = state;
        let eligible: Vec<(usize, i64)> = view
            .businesses
            .iter()
            .enumerate()
            .filter(|(_, b)| b.can_collect_on(day))
            .map(|(i, b)| (i, self.revenue_for(view, b)))
            .collect();
        if eligible.is_empty() {
            inform(
                state,
                stamp,
                "No revenue to collect! You've already collected from all your businesses today.",
            );
            return;
        }
        let mut total = 0i64;
        for (i, revenue) in &eligible {
            state.businesses[*i].last_collected_day = day;
            total = total.saturating_add(*revenue);
        }
        state.money = state.money.saturating_add(total);
        state.stats.total_revenue = state.stats.total_revenue.saturating_add(total);
        state.notify(
            NotificationKind::Success,
            format!("Collected ${total} from {} businesses!", eligible.len()),
            stamp,
        );
    }

    pub(crate) fn hire_staff(&self, state: &mut GameState, staff_type: &str, stamp: u64) {
        let Some(kind) = self.catalog.staff_type(staff_type) else {
            refuse(state, stamp, "HIRE_STAFF", "Unknown staff type!");
            return;
        };
        if self.config.enforce_catalog_rules && state.staff.iter().any(|s| s.staff_type == kind.id)
        {
            refuse(
                state,
                stamp,
                "HIRE_STAFF",
                format!("You already have a {}!", kind.name),
            );
            return;
        }
        let cost = hiring_cost(kind.base_salary);
        if state.money < cost {
            refuse(
                state,
                stamp,
                "HIRE_STAFF",
                "Not enough money to hire this staff member!",
            );
            return;
        }
        let id = instance_id(&kind.id, stamp, |id| state.staff.iter().any(|s| s.id == id));
        state.money -= cost;
        state.stats.total_expenses = state.stats.total_expenses.saturating_add(cost);
        state.staff.push(Staff {
            id,
            staff_type: kind.id.clone(),
            salary: kind.base_salary,
            effect: kind.effect.clone(),
        });
        state.notify(
            NotificationKind::Success,
            format!("Hired a new {}!", kind.name),
            stamp,
        );
    }

    pub(crate) fn purchase_upgrade(
        &self,
        state: &mut GameState,
        upgrade_type: &str,
        business_id: &str,
        stamp: u64,
    ) {
        let Some(kind) = self.catalog.upgrade(upgrade_type) else {
            refuse(state, stamp, "PURCHASE_UPGRADE", "Unknown upgrade type!");
            return;
        };
        let Some(business) = state.business(business_id) else {
            refuse(state, stamp, "PURCHASE_UPGRADE", "Business not found!");
            return;
        };
        if self.config.enforce_catalog_rules
            && business.upgrades.iter().any(|u| u.upgrade_type == kind.id)
        {
            refuse(
                state,
                stamp,
                "PURCHASE_UPGRADE",
                format!("This business already has the {} upgrade!", kind.name),
            );
            return;
        }
        if state.money < kind.base_price {
            refuse(
                state,
                stamp,
                "PURCHASE_UPGRADE",
                "Not enough money for this upgrade!",
            );
            return;
        }
        let id = instance_id(&kind.id, stamp, |id| {
            state
                .businesses
                .iter()
                .flat_map(|b| &b.upgrades)
                .any(|u| u.id == id)
        });
        state.money -= kind.base_price;
        state.stats.total_expenses = state.stats.total_expenses.saturating_add(kind.base_price);
        if let Some(b) = state.business_mut(business_id) {
            b.upgrades.push(Upgrade {
                id,
                upgrade_type: kind.id.clone(),
                effect: kind.effect.clone(),
            });
        }
        state.notify(
            NotificationKind::Success,
            format!("Purchased {} upgrade!", kind.name),
            stamp,
        );
    }

    pub(crate) fn sell_business(&self, state: &mut GameState, business_id: &str, stamp: u64) {
        let Some(index) = state.businesses.iter().position(|b| b.id == business_id) else {
            refuse(state, stamp, "SELL_BUSINESS", "Business not found!");
            return;
        };
        let Some(value) = sell_value(&self.catalog, &state.businesses[index]) else {
            refuse(state, stamp, "SELL_BUSINESS", "Unknown business type!");
            return;
        };
        let sold = state.businesses.remove(index);
        let name = self
            .catalog
            .business(&sold.business_type)
            .map_or(sold.business_type.as_str(), |k| k.name.as_str());
        state.money = state.money.saturating_add(value);
        state.notify(
            NotificationKind::Success,
            format!("Sold {name} for ${value}!"),
            stamp,
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::*;
    use crate::{Action, Engine, EngineConfig};
    use proptest::prelude::*;
    use tycoon_core::{GameState, NotificationKind};

    fn buy(kind: &str) -> Action {
        Action::PurchaseBusiness {
            business_type: kind.into(),
        }
    }

    fn collect(id: &str) -> Action {
        Action::CollectRevenue {
            business_id: id.into(),
        }
    }

    #[test]
    fn purchase_debits_price() {
        let s = run(&engine(), &GameState::fresh(true), &[buy("coffee_shop")]);
        assert_eq!(s.money, 5_000);
        assert_eq!(s.businesses.len(), 1);
        let b = &s.businesses[0];
        assert_eq!(b.level, 1);
        assert_eq!(b.purchased_on_day, 1);
        assert_eq!(b.last_collected_day, 1);
        assert_eq!(last_kind(&s), NotificationKind::Success);
    }

    #[test]
    fn purchase_without_funds_is_refused() {
        let mut s0 = GameState::fresh(true);
        s0.money = 4_999;
        let s = run(&engine(), &s0, &[buy("coffee_shop")]);
        assert_eq!(s.money, 4_999);
        assert!(s.businesses.is_empty());
        assert_eq!(
            s.notifications[0].message,
            "Not enough money to purchase this business!"
        );
        assert_eq!(last_kind(&s), NotificationKind::Error);
    }

    #[test]
    fn same_day_purchases_get_distinct_ids() {
        let s = run(
            &engine(),
            &GameState::fresh(true),
            &[buy("coffee_shop"), buy("coffee_shop")],
        );
        assert_eq!(s.businesses.len(), 2);
        assert_ne!(s.businesses[0].id, s.businesses[1].id);
    }

    #[test]
    fn collecting_on_purchase_day_is_refused() {
        let engine = engine();
        let s = run(&engine, &GameState::fresh(true), &[buy("coffee_shop")]);
        let id = s.businesses[0].id.clone();
        let s = run(&engine, &s, &[collect(&id)]);
        assert_eq!(s.money, 5_000);
        assert_eq!(last_kind(&s), NotificationKind::Error);
        assert_eq!(s.stats.total_revenue, 0);
    }

    #[test]
    fn collect_next_day_credits_base_revenue_once() {
        let engine = engine();
        let s = run(
            &engine,
            &GameState::fresh(true),
            &[buy("coffee_shop"), Action::AdvanceDay],
        );
        assert_eq!(s.day, 2);
        let id = s.businesses[0].id.clone();
        let s = run(&engine, &s, &[collect(&id)]);
        assert_eq!(s.money, 5_500);
        assert_eq!(s.stats.total_revenue, 500);
        assert_eq!(s.businesses[0].last_collected_day, 2);

        let again = run(&engine, &s, &[collect(&id)]);
        assert_eq!(again.money, 5_500);
        assert_eq!(again.stats.total_revenue, 500);
        assert_eq!(
            again.notifications.last().unwrap().message,
            "You've already collected revenue from this business today!"
        );
    }

    #[test]
    fn staff_and_upgrades_raise_revenue() {
        let engine = engine();
        let mut s0 = GameState::fresh(true);
        s0.money = 100_000;
        let s = run(&engine, &s0, &[buy("coffee_shop")]);
        let id = s.businesses[0].id.clone();
        let s = run(
            &engine,
            &s,
            &[
                Action::HireStaff {
                    staff_type: "marketer".into(),
                },
                Action::HireStaff {
                    staff_type: "consultant".into(),
                },
                Action::PurchaseUpgrade {
                    upgrade_type: "equipment".into(),
                    business_id: id.clone(),
                },
                Action::AdvanceDay,
                collect(&id),
            ],
        );
        // 500 × (1 + 0.15 + 0.05 + 0.2)
        assert_eq!(s.stats.total_revenue, 700);
    }

    #[test]
    fn collect_all_sums_eligible_businesses() {
        let engine = engine();
        let mut s0 = GameState::fresh(true);
        s0.money = 50_000;
        let s = run(
            &engine,
            &s0,
            &[buy("coffee_shop"), buy("restaurant"), Action::AdvanceDay],
        );
        let money = s.money;
        let s = run(&engine, &s, &[buy("coffee_shop"), Action::CollectAllRevenue]);
        let restaurant = engine.catalog().business("restaurant").unwrap().base_revenue;
        assert_eq!(s.stats.total_revenue, 500 + restaurant);
        assert_eq!(s.money, money - 5_000 + 500 + restaurant);
        assert_eq!(
            s.notifications.last().unwrap().message,
            format!("Collected ${} from 2 businesses!", 500 + restaurant)
        );

        let again = run(&engine, &s, &[Action::CollectAllRevenue]);
        assert_eq!(again.money, s.money);
        assert_eq!(last_kind(&again), NotificationKind::Info);
    }

    #[test]
    fn collect_all_without_businesses_informs() {
        let s = run(&engine(), &GameState::fresh(true), &[Action::CollectAllRevenue]);
        assert_eq!(s.money, 10_000);
        assert_eq!(last_kind(&s), NotificationKind::Info);
    }

    #[test]
    fn hiring_costs_three_days_of_salary() {
        let s = run(
            &engine(),
            &GameState::fresh(true),
            &[Action::HireStaff {
                staff_type: "manager".into(),
            }],
        );
        assert_eq!(s.money, 7_000);
        assert_eq!(s.stats.total_expenses, 3_000);
        assert_eq!(s.staff[0].salary, 1_000);
    }

    #[test]
    fn hired_staff_keep_their_effect_snapshot() {
        let mut catalog = engine().catalog().clone();
        let s = run(
            &engine(),
            &GameState::fresh(true),
            &[Action::HireStaff {
                staff_type: "marketer".into(),
            }],
        );
        catalog.staff[1].effect.value = rust_decimal::Decimal::new(9, 1);
        let edited = Engine::new(catalog, EngineConfig::default());
        let s = run(&edited, &s, &[]);
        assert_eq!(s.staff[0].effect.value, rust_decimal::Decimal::new(15, 2));
    }

    #[test]
    fn duplicate_staff_allowed_unless_rules_enforced() {
        let hire = Action::HireStaff {
            staff_type: "manager".into(),
        };
        let s = run(&engine(), &GameState::fresh(true), &[hire.clone(), hire.clone()]);
        assert_eq!(s.staff.len(), 2);

        let strict = Engine::standard(EngineConfig {
            enforce_catalog_rules: true,
            ..EngineConfig::default()
        })
        .unwrap();
        let s = run(&strict, &GameState::fresh(true), &[hire.clone(), hire]);
        assert_eq!(s.staff.len(), 1);
        assert_eq!(s.money, 7_000);
        assert_eq!(last_kind(&s), NotificationKind::Error);
    }

    #[test]
    fn unlock_level_enforced_only_when_configured() {
        let mut s0 = GameState::fresh(true);
        s0.money = 10_000_000;
        let locked = engine()
            .catalog()
            .businesses
            .iter()
            .find(|b| b.unlock_level > 1)
            .unwrap()
            .id
            .clone();
        let s = run(&engine(), &s0, &[buy(&locked)]);
        assert_eq!(s.businesses.len(), 1);

        let strict = Engine::standard(EngineConfig {
            enforce_catalog_rules: true,
            ..EngineConfig::default()
        })
        .unwrap();
        let s = run(&strict, &s0, &[buy(&locked)]);
        assert!(s.businesses.is_empty());
        assert_eq!(s.money, 10_000_000);
    }

    #[test]
    fn upgrade_on_missing_business_is_refused() {
        let s = run(
            &engine(),
            &GameState::fresh(true),
            &[Action::PurchaseUpgrade {
                upgrade_type: "training".into(),
                business_id: "nope".into(),
            }],
        );
        assert_eq!(s.money, 10_000);
        assert_eq!(s.notifications[0].message, "Business not found!");
    }

    #[test]
    fn repeated_upgrades_refused_only_when_enforced() {
        let mut s0 = GameState::fresh(true);
        s0.money = 100_000;
        let s = run(&engine(), &s0, &[buy("coffee_shop")]);
        let id = s.businesses[0].id.clone();
        let up = Action::PurchaseUpgrade {
            upgrade_type: "training".into(),
            business_id: id,
        };
        let lax = run(&engine(), &s, &[up.clone(), up.clone()]);
        assert_eq!(lax.businesses[0].upgrades.len(), 2);
        assert_eq!(lax.stats.total_expenses, 6_000);

        let strict = Engine::standard(EngineConfig {
            enforce_catalog_rules: true,
            ..EngineConfig::default()
        })
        .unwrap();
        let s = run(&strict, &s, &[up.clone(), up]);
        assert_eq!(s.businesses[0].upgrades.len(), 1);
    }

    #[test]
    fn selling_refunds_level_value_and_upgrades() {
        let engine = engine();
        let mut s0 = GameState::fresh(true);
        s0.money = 20_000;
        let s = run(&engine, &s0, &[buy("coffee_shop")]);
        let id = s.businesses[0].id.clone();
        let s = run(
            &engine,
            &s,
            &[
                Action::PurchaseUpgrade {
                    upgrade_type: "training".into(),
                    business_id: id.clone(),
                },
                Action::SellBusiness { business_id: id },
            ],
        );
        assert!(s.businesses.is_empty());
        assert_eq!(s.money, 20_000);
        assert_eq!(
            s.notifications.last().unwrap().message,
            "Sold Coffee Shop for $8000!"
        );
    }

    #[test]
    fn economic_actions_refused_after_game_over() {
        let mut s0 = GameState::fresh(true);
        s0.game_over = true;
        let s = run(&engine(), &s0, &[buy("coffee_shop")]);
        assert!(s.businesses.is_empty());
        assert_eq!(s.money, 10_000);
        assert_eq!(last_kind(&s), NotificationKind::Error);
    }

    proptest! {
        #[test]
        fn second_collection_same_day_never_pays(days in 1u32..20) {
            let engine = engine();
            let mut s = run(&engine, &GameState::fresh(true), &[buy("coffee_shop")]);
            for _ in 0..days {
                s = run(&engine, &s, &[Action::AdvanceDay]);
            }
            let id = s.businesses[0].id.clone();
            let first = run(&engine, &s, &[collect(&id)]);
            let second = run(&engine, &first, &[collect(&id)]);
            prop_assert!(first.money > s.money);
            prop_assert_eq!(second.money, first.money);
            prop_assert_eq!(second.stats.total_revenue, first.stats.total_revenue);
        }
    }
}
