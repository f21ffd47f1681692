//! A simple automatic player: collect, expand when affordable, hire a
//! marketer once, end the day.

use tycoon_core::{Catalog, GameState};
use tycoon_econ::hiring_cost;
use tycoon_engine::Action;

/// Days of salary kept in reserve before spending.
const SALARY_RESERVE_DAYS: i64 = 5;

/// The moves for one day, ending with `AdvanceDay`.
pub fn plan_day(catalog: &Catalog, state: &GameState) -> Vec<Action> {
    let mut actions = Vec::new();
    let mut money = state.money;

    let collectable = state.businesses.iter().any(|b| b.can_collect_on(state.day));
    if collectable {
        actions.push(Action::CollectAllRevenue);
    }

    let salaries: i64 = state.staff.iter().map(|s| s.salary).sum();
    let reserve = salaries * SALARY_RESERVE_DAYS;

    let best = catalog
        .businesses
        .iter()
        .filter(|b| b.unlock_level <= state.level && b.base_price <= money - reserve)
        .max_by_key(|b| b.base_price);
    if let Some(kind) = best {
        money -= kind.base_price;
        actions.push(Action::PurchaseBusiness {
            business_type: kind.id.clone(),
        });
    }

    let has_marketer = state.staff.iter().any(|s| s.staff_type == "marketer");
    if let Some(marketer) = catalog.staff_type("marketer") {
        let cost = hiring_cost(marketer.base_salary);
        if !has_marketer && !state.businesses.is_empty() && cost <= money - reserve {
            actions.push(Action::HireStaff {
                staff_type: marketer.id.clone(),
            });
        }
    }

    actions.push(Action::AdvanceDay);
    actions
}
