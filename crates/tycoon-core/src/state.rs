//! The game-state aggregate and the records it owns.
//!
//! Field names serialize in camelCase so saved documents keep the shape the
//! web client and the save API exchange.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::{Effect, Requirements, SpecialEventDef};

/// Starting cash for a fresh game.
pub const STARTING_MONEY: i64 = 10_000;
/// Experience needed for the first level-up.
pub const STARTING_EXPERIENCE_THRESHOLD: u64 = 1_000;

/// Severity of a user-facing message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient message shown to the player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(deserialize_with = "notification_id")]
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
}

/// Web-client saves may carry fractional ids; keep the whole milliseconds.
fn notification_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Whole(u64),
        Fractional(f64),
    }
    match RawId::deserialize(deserializer)? {
        RawId::Whole(id) => Ok(id),
        RawId::Fractional(id) if id.is_finite() && id >= 0.0 => Ok(id.trunc() as u64),
        RawId::Fractional(id) => Err(D::Error::custom(format!(
            "invalid notification id {id}"
        ))),
    }
}

/// An upgrade applied to one business; the effect is a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Upgrade {
    pub id: String,
    #[serde(rename = "type")]
    pub upgrade_type: String,
    pub effect: Effect,
}

/// A purchased business.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: String,
    #[serde(rename = "type")]
    pub business_type: String,
    /// Multiplier on base revenue and base value; starts at 1.
    pub level: u32,
    pub last_collected_day: u32,
    pub purchased_on_day: u32,
    #[serde(default)]
    pub upgrades: Vec<Upgrade>,
}

impl Business {
    /// Collection is allowed once per day and never on the purchase day.
    pub fn can_collect_on(&self, day: u32) -> bool {
        self.purchased_on_day != day && self.last_collected_day != day
    }
}

/// A hired staff member; salary and effect are fixed at hire time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub id: String,
    #[serde(rename = "type")]
    pub staff_type: String,
    pub salary: i64,
    pub effect: Effect,
}

/// A running or just-expired market event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketEvent {
    /// Unique per occurrence.
    pub id: String,
    /// Catalog id the occurrence was created from.
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub name: String,
    pub effect: Effect,
    pub active: bool,
    pub remaining_days: u32,
    #[serde(default)]
    pub started_at: u32,
}

/// Metrics tracked by an active special event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProgressMetric {
    Revenue,
    Investment,
    GreenInvestment,
    Customers,
    Sales,
    StaffHired,
}

/// Accumulated counters for one special event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventProgress {
    #[serde(default)]
    pub revenue: u64,
    #[serde(default)]
    pub investment: u64,
    #[serde(default)]
    pub green_investment: u64,
    #[serde(default)]
    pub customers: u64,
    #[serde(default)]
    pub sales: u64,
    #[serde(default)]
    pub staff_hired: u64,
    #[serde(default)]
    pub completed: bool,
}

impl EventProgress {
    pub fn get(&self, metric: ProgressMetric) -> u64 {
        match metric {
            ProgressMetric::Revenue => self.revenue,
            ProgressMetric::Investment => self.investment,
            ProgressMetric::GreenInvestment => self.green_investment,
            ProgressMetric::Customers => self.customers,
            ProgressMetric::Sales => self.sales,
            ProgressMetric::StaffHired => self.staff_hired,
        }
    }

    /// Counters only grow.
    pub fn add(&mut self, metric: ProgressMetric, amount: u64) {
        let slot = match metric {
            ProgressMetric::Revenue => &mut self.revenue,
            ProgressMetric::Investment => &mut self.investment,
            ProgressMetric::GreenInvestment => &mut self.green_investment,
            ProgressMetric::Customers => &mut self.customers,
            ProgressMetric::Sales => &mut self.sales,
            ProgressMetric::StaffHired => &mut self.staff_hired,
        };
        *slot = slot.saturating_add(amount);
    }

    /// Whether every declared numeric target is reached. Business counts are
    /// checked separately against the owned businesses.
    pub fn meets(&self, req: &Requirements) -> bool {
        let targets = [
            (req.revenue_target, ProgressMetric::Revenue),
            (req.investment_target, ProgressMetric::Investment),
            (req.green_investment_target, ProgressMetric::GreenInvestment),
            (req.customer_target, ProgressMetric::Customers),
            (req.sales_target, ProgressMetric::Sales),
            (req.staff_hiring_target, ProgressMetric::StaffHired),
        ];
        targets
            .iter()
            .all(|(target, metric)| target.map_or(true, |t| self.get(*metric) >= t))
    }
}

/// A started special event: a definition snapshot plus its window and
/// progress.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialEvent {
    #[serde(flatten)]
    pub definition: SpecialEventDef,
    pub start_day: u32,
    /// `start_day + duration`; the event expires once `day > end_day`.
    pub end_day: u32,
    #[serde(default)]
    pub progress: EventProgress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_day: Option<u32>,
    /// Wall-clock completion time in ms since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

impl SpecialEvent {
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

/// Unlock token recorded for rewards the engine does not apply itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardToken {
    pub id: String,
    /// `upgrade`, `staff` or `special_business`.
    #[serde(rename = "type")]
    pub reward_type: String,
    pub description: String,
    pub from_event: String,
    /// ms since the epoch.
    pub date_awarded: i64,
}

/// Cumulative counters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_revenue: i64,
    pub total_expenses: i64,
    pub net_worth: i64,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            total_revenue: 0,
            total_expenses: 0,
            net_worth: STARTING_MONEY,
        }
    }
}

/// The single aggregate the engine transitions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameState {
    pub initialized: bool,
    pub show_tutorial: bool,
    /// May go negative; negative net worth means bankruptcy.
    pub money: i64,
    pub day: u32,
    pub level: u32,
    pub experience: u64,
    pub experience_to_next_level: u64,
    /// Purchase order.
    pub businesses: Vec<Business>,
    pub staff: Vec<Staff>,
    pub market_events: Vec<MarketEvent>,
    pub active_special_events: Vec<SpecialEvent>,
    pub completed_special_events: Vec<SpecialEvent>,
    pub special_event_rewards: Vec<RewardToken>,
    pub game_over: bool,
    pub stats: Stats,
    pub notifications: Vec<Notification>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::fresh(true)
    }
}

impl GameState {
    /// A new game: 10 000 cash on day 1, nothing owned.
    pub fn fresh(show_tutorial: bool) -> Self {
        Self {
            initialized: false,
            show_tutorial,
            money: STARTING_MONEY,
            day: 1,
            level: 1,
            experience: 0,
            experience_to_next_level: STARTING_EXPERIENCE_THRESHOLD,
            businesses: Vec::new(),
            staff: Vec::new(),
            market_events: Vec::new(),
            active_special_events: Vec::new(),
            completed_special_events: Vec::new(),
            special_event_rewards: Vec::new(),
            game_over: false,
            stats: Stats::default(),
            notifications: Vec::new(),
        }
    }

    /// Parse a saved document. Notification ids that collide after
    /// truncation are moved past the largest id.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut state: Self = serde_json::from_str(json)?;
        let mut seen = std::collections::BTreeSet::new();
        let mut top = state.notifications.iter().map(|n| n.id).max().unwrap_or(0);
        for n in &mut state.notifications {
            if !seen.insert(n.id) {
                top = top.saturating_add(1);
                n.id = top;
                seen.insert(top);
            }
        }
        Ok(state)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn business(&self, id: &str) -> Option<&Business> {
        self.businesses.iter().find(|b| b.id == id)
    }

    pub fn business_mut(&mut self, id: &str) -> Option<&mut Business> {
        self.businesses.iter_mut().find(|b| b.id == id)
    }

    /// Number of owned businesses of the given type.
    pub fn count_of_type(&self, business_type: &str) -> usize {
        self.businesses
            .iter()
            .filter(|b| b.business_type == business_type)
            .count()
    }

    pub fn active_special_event(&self, id: &str) -> Option<&SpecialEvent> {
        self.active_special_events.iter().find(|e| e.id() == id)
    }

    /// Append a notification whose id is at least `stamp` and greater than
    /// every id already present.
    pub fn notify(&mut self, kind: NotificationKind, message: impl Into<String>, stamp: u64) {
        let next = self
            .notifications
            .iter()
            .map(|n| n.id + 1)
            .max()
            .unwrap_or(0)
            .max(stamp);
        self.notifications.push(Notification {
            id: next,
            kind,
            message: message.into(),
        });
    }

    pub fn clear_notification(&mut self, id: u64) {
        self.notifications.retain(|n| n.id != id);
    }
}
