//! Static catalog tables: business, staff, upgrade, market-event and
//! special-event definitions.
//!
//! The catalog is read-only at runtime. Effects are copied out of it when a
//! staff member is hired or an upgrade is bought, so editing the catalog never
//! changes instances the player already owns.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::ValidationError;

const STANDARD_CATALOG: &str = include_str!("../../../assets/catalog.yaml");

/// Kind of modifier an [`Effect`] applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Adds to the revenue multiplier.
    Revenue,
    /// Adds to the revenue multiplier (upgrades).
    Productivity,
    /// Operational efficiency; tracked but not priced.
    Efficiency,
    /// Expense modifier; tracked but not priced.
    Expenses,
    /// Applies to every metric, revenue included.
    All,
    /// Boost for a single business type.
    SpecificBusiness,
    /// Anything an older save carries that this build does not know. The
    /// original name is not kept: it is written back as `"other"`.
    #[serde(other)]
    Other,
}

impl EffectKind {
    /// Whether this effect contributes to the revenue multiplier.
    pub fn affects_revenue(self) -> bool {
        matches!(self, Self::Revenue | Self::Productivity | Self::All)
    }
}

/// Effect descriptor shared by catalog entries and owned instances.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    #[serde(rename = "type")]
    pub kind: EffectKind,
    /// Signed magnitude, e.g. 0.15 for +15%.
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    /// Duration in days (market events only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

/// A purchasable business type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessType {
    pub id: String,
    pub name: String,
    pub base_price: i64,
    pub base_revenue: i64,
    #[serde(default)]
    pub description: String,
    /// Player level at which the type becomes visible.
    pub unlock_level: u32,
    #[serde(default)]
    pub icon: String,
    /// Upgrades bought for green businesses count as green investment.
    #[serde(default)]
    pub green: bool,
}

/// A hireable staff type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffType {
    pub id: String,
    pub name: String,
    /// Daily salary; hiring costs three times this.
    pub base_salary: i64,
    #[serde(default)]
    pub description: String,
    pub effect: Effect,
    #[serde(default)]
    pub icon: String,
}

/// A per-business upgrade type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeType {
    pub id: String,
    pub name: String,
    pub base_price: i64,
    #[serde(default)]
    pub description: String,
    pub effect: Effect,
    #[serde(default)]
    pub icon: String,
}

/// A random market event type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketEventType {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub effect: Effect,
    /// Compared against the shared daily draw, in catalog order.
    pub probability: f64,
    #[serde(default)]
    pub icon: String,
}

/// Minimum number of businesses of one type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessCount {
    #[serde(rename = "type")]
    pub business_type: String,
    pub count: usize,
}

/// Business-count requirement: one threshold or several.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BusinessCountRequirement {
    One(BusinessCount),
    Many(Vec<BusinessCount>),
}

impl BusinessCountRequirement {
    /// All declared thresholds as a slice.
    pub fn thresholds(&self) -> &[BusinessCount] {
        match self {
            Self::One(one) => std::slice::from_ref(one),
            Self::Many(many) => many,
        }
    }
}

/// Goals a special event declares. Absent targets are not checked.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_count: Option<BusinessCountRequirement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_target: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment_target: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub green_investment_target: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_target: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_target: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_hiring_target: Option<u64>,
}

/// One-time reward granted when a special event completes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reward {
    Money { value: i64, description: String },
    Experience { value: u64, description: String },
    Upgrade { id: String, description: String },
    Staff { id: String, description: String },
    SpecialBusiness { id: String, description: String },
}

impl Reward {
    pub fn description(&self) -> &str {
        match self {
            Self::Money { description, .. }
            | Self::Experience { description, .. }
            | Self::Upgrade { description, .. }
            | Self::Staff { description, .. }
            | Self::SpecialBusiness { description, .. } => description,
        }
    }
}

/// Rarity tier, display only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

/// Calendar month (1-12) in which a seasonal event triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalTiming {
    pub month: u32,
}

/// A limited-time challenge definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialEventDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
    /// Days the event stays open after it starts.
    pub duration: u32,
    #[serde(default)]
    pub target_business_types: Vec<String>,
    #[serde(default)]
    pub requirements: Requirements,
    #[serde(default)]
    pub rewards: Vec<Reward>,
    #[serde(default)]
    pub icon: String,
    pub rarity: Rarity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasonal_timing: Option<SeasonalTiming>,
}

/// Errors raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid catalog: {0}")]
    Invalid(#[from] ValidationError),
}

/// All static definitions used by the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub businesses: Vec<BusinessType>,
    pub staff: Vec<StaffType>,
    pub upgrades: Vec<UpgradeType>,
    pub market_events: Vec<MarketEventType>,
    pub special_events: Vec<SpecialEventDef>,
}

impl Catalog {
    /// The catalog shipped with the game.
    pub fn standard() -> Result<Self, CatalogError> {
        Self::from_yaml(STANDARD_CATALOG)
    }

    /// Parse and validate a catalog from YAML.
    pub fn from_yaml(text: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_yaml::from_str(text)?;
        validate_catalog(&catalog)?;
        Ok(catalog)
    }

    pub fn business(&self, id: &str) -> Option<&BusinessType> {
        self.businesses.iter().find(|b| b.id == id)
    }

    pub fn staff_type(&self, id: &str) -> Option<&StaffType> {
        self.staff.iter().find(|s| s.id == id)
    }

    pub fn upgrade(&self, id: &str) -> Option<&UpgradeType> {
        self.upgrades.iter().find(|u| u.id == id)
    }

    pub fn market_event(&self, id: &str) -> Option<&MarketEventType> {
        self.market_events.iter().find(|e| e.id == id)
    }

    pub fn special_event(&self, id: &str) -> Option<&SpecialEventDef> {
        self.special_events.iter().find(|e| e.id == id)
    }
}

fn check_unique<'a>(
    table: &'static str,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyId(table));
        }
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateId(id.to_string()));
        }
    }
    Ok(())
}

/// Validate catalog invariants, including cross-references from special
/// events to business types.
pub fn validate_catalog(catalog: &Catalog) -> Result<(), ValidationError> {
    check_unique("businesses", catalog.businesses.iter().map(|b| b.id.as_str()))?;
    check_unique("staff", catalog.staff.iter().map(|s| s.id.as_str()))?;
    check_unique("upgrades", catalog.upgrades.iter().map(|u| u.id.as_str()))?;
    check_unique(
        "marketEvents",
        catalog.market_events.iter().map(|e| e.id.as_str()),
    )?;
    check_unique(
        "specialEvents",
        catalog.special_events.iter().map(|e| e.id.as_str()),
    )?;

    for b in &catalog.businesses {
        if b.base_price < 0 || b.base_revenue < 0 {
            return Err(ValidationError::NegativeMoney(b.id.clone()));
        }
    }
    for s in &catalog.staff {
        if s.base_salary < 0 {
            return Err(ValidationError::NegativeMoney(s.id.clone()));
        }
    }
    for u in &catalog.upgrades {
        if u.base_price < 0 {
            return Err(ValidationError::NegativeMoney(u.id.clone()));
        }
    }
    for e in &catalog.market_events {
        if !e.probability.is_finite() || !(0.0..=1.0).contains(&e.probability) {
            return Err(ValidationError::InvalidProbability(e.id.clone()));
        }
        if e.effect.duration.unwrap_or(0) == 0 {
            return Err(ValidationError::NonPositiveDuration(e.id.clone()));
        }
    }
    for e in &catalog.special_events {
        if e.duration == 0 {
            return Err(ValidationError::NonPositiveDuration(e.id.clone()));
        }
        if let Some(timing) = e.seasonal_timing {
            if !(1..=12).contains(&timing.month) {
                return Err(ValidationError::InvalidMonth(timing.month));
            }
        }
        if let Some(req) = &e.requirements.business_count {
            for t in req.thresholds() {
                if catalog.business(&t.business_type).is_none() {
                    return Err(ValidationError::UnknownBusinessType(
                        t.business_type.clone(),
                    ));
                }
            }
        }
    }
    Ok(())
}
