#![deny(warnings)]

//! Economic formulas for Business Tycoon.
//!
//! This module provides the pure calculations the progression engine applies:
//! - Revenue multiplier and collected revenue per business
//! - Asset value, sell value, net worth and the bankruptcy predicate
//! - Hiring cost, daily experience and level-ups
//! - The shared-draw market-event roll

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::trace;
use tycoon_core::{Business, Catalog, Effect, MarketEventType};

/// Hiring costs this many days of salary up front.
pub const HIRING_COST_FACTOR: i64 = 3;
/// Flat daily experience once the player owns anything.
pub const DAILY_EXPERIENCE_BASE: u64 = 100;
/// Additional daily experience per owned business.
pub const DAILY_EXPERIENCE_PER_BUSINESS: u64 = 50;

/// Revenue multiplier: 1 plus every revenue-affecting effect value.
///
/// Only `revenue`, `productivity` and `all` effects count. Callers pass the
/// staff effects, the business's upgrade effects and the active market-event
/// effects.
///
/// Example:
/// let m = revenue_multiplier([]);
/// assert_eq!(m, Decimal::ONE);
pub fn revenue_multiplier<'a>(effects: impl IntoIterator<Item = &'a Effect>) -> Decimal {
    effects
        .into_iter()
        .filter(|e| e.kind.affects_revenue())
        .fold(Decimal::ONE, |acc, e| acc + e.value)
}

/// Revenue collected from one business: `round(base × level × multiplier)`,
/// half rounding up.
///
/// Example:
/// assert_eq!(collected_revenue(500, 1, Decimal::ONE), 500);
pub fn collected_revenue(base_revenue: i64, level: u32, multiplier: Decimal) -> i64 {
    let raw = Decimal::from(base_revenue) * Decimal::from(level) * multiplier;
    let rounded = (raw + Decimal::new(5, 1)).floor();
    rounded.to_i64().unwrap_or(if rounded.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Revenue a business yields today given the current staff and market
/// events. Unknown business types yield nothing.
pub fn business_revenue<'a>(
    catalog: &Catalog,
    business: &'a Business,
    staff_effects: impl IntoIterator<Item = &'a Effect>,
    event_effects: impl IntoIterator<Item = &'a Effect>,
) -> i64 {
    let Some(kind) = catalog.business(&business.business_type) else {
        return 0;
    };
    let multiplier = revenue_multiplier(
        staff_effects
            .into_iter()
            .chain(business.upgrades.iter().map(|u| &u.effect))
            .chain(event_effects),
    );
    let revenue = collected_revenue(kind.base_revenue, business.level, multiplier);
    trace!(business = %business.id, %multiplier, revenue, "revenue computed");
    revenue
}

/// Asset value of a business: `base_price × level`.
pub fn business_value(base_price: i64, level: u32) -> i64 {
    base_price.saturating_mul(i64::from(level))
}

/// Sale proceeds: asset value plus the catalog price of every applied upgrade.
/// Upgrades whose type is no longer in the catalog add nothing.
pub fn sell_value(catalog: &Catalog, business: &Business) -> Option<i64> {
    let kind = catalog.business(&business.business_type)?;
    let upgrades: i64 = business
        .upgrades
        .iter()
        .filter_map(|u| catalog.upgrade(&u.upgrade_type))
        .map(|u| u.base_price)
        .sum();
    Some(business_value(kind.base_price, business.level).saturating_add(upgrades))
}

/// Net worth: cash plus the asset value of every owned business.
pub fn net_worth(catalog: &Catalog, money: i64, businesses: &[Business]) -> i64 {
    businesses
        .iter()
        .filter_map(|b| {
            catalog
                .business(&b.business_type)
                .map(|kind| business_value(kind.base_price, b.level))
        })
        .fold(money, i64::saturating_add)
}

/// Bankrupt when net worth is negative, or when cash is exhausted and there
/// is nothing left to sell.
pub fn is_bankrupt(net_worth: i64, money: i64, business_count: usize) -> bool {
    net_worth < 0 || (money <= 0 && business_count == 0)
}

/// Up-front cost of hiring a staff member.
pub fn hiring_cost(base_salary: i64) -> i64 {
    base_salary.saturating_mul(HIRING_COST_FACTOR)
}

/// Experience earned by one day-advance; zero without businesses.
pub fn daily_experience(business_count: usize) -> u64 {
    if business_count == 0 {
        return 0;
    }
    DAILY_EXPERIENCE_BASE + DAILY_EXPERIENCE_PER_BUSINESS * business_count as u64
}

/// Threshold for the level after the current one: ×1.5, floored.
pub fn next_threshold(threshold: u64) -> u64 {
    (threshold.saturating_mul(3) / 2).max(1)
}

/// Level, experience and threshold after a level-up check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progression {
    pub level: u32,
    pub experience: u64,
    pub experience_to_next_level: u64,
}

impl Progression {
    /// Level up while experience covers the threshold, carrying the
    /// remainder.
    pub fn settle(mut self) -> Self {
        while self.experience_to_next_level > 0
            && self.experience >= self.experience_to_next_level
        {
            self.experience -= self.experience_to_next_level;
            self.level = self.level.saturating_add(1);
            self.experience_to_next_level = next_threshold(self.experience_to_next_level);
        }
        self
    }
}

/// Scan market-event types in catalog order and return the first whose
/// probability is at least `roll`.
///
/// Every entry is compared against the same draw rather than against a
/// cumulative threshold, so an entry only wins when its probability exceeds
/// every earlier entry's and the draw lands between them.
pub fn roll_market_event(events: &[MarketEventType], roll: f64) -> Option<&MarketEventType> {
    events.iter().find(|e| roll <= e.probability)
}
