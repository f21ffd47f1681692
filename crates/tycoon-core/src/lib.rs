#![deny(warnings)]

//! Core domain models and invariants for Business Tycoon.
//!
//! This crate defines the serializable game state, the static catalog, and
//! validation helpers that guard both.

pub mod catalog;
pub mod state;

use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

pub use catalog::{
    BusinessCount, BusinessCountRequirement, BusinessType, Catalog, CatalogError, Effect,
    EffectKind, MarketEventType, Rarity, Requirements, Reward, SeasonalTiming, SpecialEventDef,
    StaffType, UpgradeType,
};
pub use state::{
    Business, EventProgress, GameState, MarketEvent, Notification, NotificationKind,
    ProgressMetric, RewardToken, SpecialEvent, Staff, Stats, Upgrade, STARTING_EXPERIENCE_THRESHOLD,
    STARTING_MONEY,
};

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A catalog table contains an empty id.
    #[error("empty id in {0}")]
    EmptyId(&'static str),
    /// The same id appears twice.
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    /// Price, revenue or salary below zero.
    #[error("negative monetary value for {0}")]
    NegativeMoney(String),
    /// Probability outside [0, 1].
    #[error("probability out of range for {0}")]
    InvalidProbability(String),
    /// Durations must be at least one day.
    #[error("duration must be > 0 for {0}")]
    NonPositiveDuration(String),
    /// Month outside 1..=12.
    #[error("month {0} is out of range [1, 12]")]
    InvalidMonth(u32),
    /// Reference to a business type the catalog does not define.
    #[error("unknown business type: {0}")]
    UnknownBusinessType(String),
    /// Day counter starts at 1.
    #[error("day must be >= 1")]
    InvalidDay,
    /// Level and experience threshold must be positive.
    #[error("level and experience threshold must be >= 1")]
    InvalidProgression,
    /// A business is ahead of the game clock.
    #[error("business {0} references a future day")]
    FutureDay(String),
    /// A business level of zero.
    #[error("business {0} has level 0")]
    ZeroLevel(String),
}

/// Validate a loaded state against the catalog before it replaces the live
/// one.
pub fn validate_state(state: &GameState, catalog: &Catalog) -> Result<(), ValidationError> {
    if state.day == 0 {
        return Err(ValidationError::InvalidDay);
    }
    if state.level == 0 || state.experience_to_next_level == 0 {
        return Err(ValidationError::InvalidProgression);
    }
    let mut ids = BTreeSet::new();
    for b in &state.businesses {
        if !ids.insert(b.id.as_str()) {
            return Err(ValidationError::DuplicateId(b.id.clone()));
        }
        if catalog.business(&b.business_type).is_none() {
            return Err(ValidationError::UnknownBusinessType(b.business_type.clone()));
        }
        if b.level == 0 {
            return Err(ValidationError::ZeroLevel(b.id.clone()));
        }
        if b.last_collected_day > state.day || b.purchased_on_day > state.day {
            return Err(ValidationError::FutureDay(b.id.clone()));
        }
    }
    debug!(
        businesses = state.businesses.len(),
        day = state.day,
        "state validated"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn business(id: &str, kind: &str, day: u32) -> Business {
        Business {
            id: id.to_string(),
            business_type: kind.to_string(),
            level: 1,
            last_collected_day: day,
            purchased_on_day: day,
            upgrades: vec![],
        }
    }

    #[test]
    fn fresh_state_is_valid() {
        let catalog = Catalog::standard().unwrap();
        validate_state(&GameState::fresh(true), &catalog).unwrap();
    }

    #[test]
    fn rejects_unknown_business_type() {
        let catalog = Catalog::standard().unwrap();
        let mut s = GameState::fresh(true);
        s.businesses.push(business("x_1", "moon_base", 1));
        assert_eq!(
            validate_state(&s, &catalog),
            Err(ValidationError::UnknownBusinessType("moon_base".into()))
        );
    }

    #[test]
    fn rejects_future_collection_day() {
        let catalog = Catalog::standard().unwrap();
        let mut s = GameState::fresh(true);
        s.businesses.push(business("coffee_shop_1", "coffee_shop", 3));
        assert_eq!(
            validate_state(&s, &catalog),
            Err(ValidationError::FutureDay("coffee_shop_1".into()))
        );
    }

    #[test]
    fn rejects_duplicate_business_ids() {
        let catalog = Catalog::standard().unwrap();
        let mut s = GameState::fresh(true);
        s.day = 2;
        s.businesses.push(business("b", "coffee_shop", 1));
        s.businesses.push(business("b", "restaurant", 2));
        assert_eq!(
            validate_state(&s, &catalog),
            Err(ValidationError::DuplicateId("b".into()))
        );
    }

    #[test]
    fn state_snapshot_roundtrip() {
        let mut s = GameState::fresh(false);
        s.day = 4;
        s.money = -250;
        s.businesses.push(business("coffee_shop_1", "coffee_shop", 2));
        s.notify(NotificationKind::Success, "hello", 7);
        let back = GameState::from_json(&s.to_json().unwrap()).unwrap();
        assert_eq!(back, s);
    }

    proptest! {
        #[test]
        fn any_day_at_or_after_purchase_is_valid(purchase in 1u32..1_000, extra in 0u32..1_000) {
            let catalog = Catalog::standard().unwrap();
            let mut s = GameState::fresh(true);
            s.day = purchase + extra;
            s.businesses.push(business("coffee_shop_1", "coffee_shop", purchase));
            prop_assert!(validate_state(&s, &catalog).is_ok());
        }
    }
}
