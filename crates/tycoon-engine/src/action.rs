//! Actions the engine accepts.
//!
//! Serialized as `{"type": "PURCHASE_BUSINESS", "payload": {...}}` so scripts
//! and hosts can describe a sequence of player moves as JSON.

use serde::{Deserialize, Serialize};
use tycoon_core::{GameState, NotificationKind, ProgressMetric};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Start from a serialized save if it parses and validates, otherwise
    /// from a fresh game.
    InitializeGame {
        #[serde(default)]
        saved: Option<String>,
    },
    /// Replace the state with one fetched from the store.
    LoadSavedGame(Box<GameState>),
    AddNotification {
        #[serde(rename = "type")]
        kind: NotificationKind,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    PurchaseBusiness { business_type: String },
    #[serde(rename_all = "camelCase")]
    CollectRevenue { business_id: String },
    CollectAllRevenue,
    #[serde(rename_all = "camelCase")]
    HireStaff { staff_type: String },
    #[serde(rename_all = "camelCase")]
    PurchaseUpgrade {
        upgrade_type: String,
        business_id: String,
    },
    #[serde(rename_all = "camelCase")]
    SellBusiness { business_id: String },
    AdvanceDay,
    #[serde(rename_all = "camelCase")]
    StartSpecialEvent { event_id: String },
    #[serde(rename_all = "camelCase")]
    UpdateSpecialEventProgress {
        event_id: String,
        progress_type: ProgressMetric,
        amount: u64,
    },
    CheckSpecialEventsProgress,
    TriggerSeasonalEvents,
    #[serde(rename_all = "camelCase")]
    CompleteSpecialEvent { event_id: String },
    CloseTutorial,
    PermanentlyDisableTutorial,
    #[serde(rename_all = "camelCase")]
    ClearNotification { notification_id: u64 },
    ClearAllNotifications,
    ResetGame,
}

impl Action {
    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InitializeGame { .. } => "INITIALIZE_GAME",
            Self::LoadSavedGame(_) => "LOAD_SAVED_GAME",
            Self::AddNotification { .. } => "ADD_NOTIFICATION",
            Self::PurchaseBusiness { .. } => "PURCHASE_BUSINESS",
            Self::CollectRevenue { .. } => "COLLECT_REVENUE",
            Self::CollectAllRevenue => "COLLECT_ALL_REVENUE",
            Self::HireStaff { .. } => "HIRE_STAFF",
            Self::PurchaseUpgrade { .. } => "PURCHASE_UPGRADE",
            Self::SellBusiness { .. } => "SELL_BUSINESS",
            Self::AdvanceDay => "ADVANCE_DAY",
            Self::StartSpecialEvent { .. } => "START_SPECIAL_EVENT",
            Self::UpdateSpecialEventProgress { .. } => "UPDATE_SPECIAL_EVENT_PROGRESS",
            Self::CheckSpecialEventsProgress => "CHECK_SPECIAL_EVENTS_PROGRESS",
            Self::TriggerSeasonalEvents => "TRIGGER_SEASONAL_EVENTS",
            Self::CompleteSpecialEvent { .. } => "COMPLETE_SPECIAL_EVENT",
            Self::CloseTutorial => "CLOSE_TUTORIAL",
            Self::PermanentlyDisableTutorial => "PERMANENTLY_DISABLE_TUTORIAL",
            Self::ClearNotification { .. } => "CLEAR_NOTIFICATION",
            Self::ClearAllNotifications => "CLEAR_ALL_NOTIFICATIONS",
            Self::ResetGame => "RESET_GAME",
        }
    }

    /// Actions that move money or businesses; refused once the game is over.
    pub fn is_economic(&self) -> bool {
        matches!(
            self,
            Self::PurchaseBusiness { .. }
                | Self::CollectRevenue { .. }
                | Self::CollectAllRevenue
                | Self::HireStaff { .. }
                | Self::PurchaseUpgrade { .. }
                | Self::SellBusiness { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dispatch_shape() {
        let a: Action = serde_json::from_str(
            r#"{"type":"PURCHASE_UPGRADE","payload":{"upgradeType":"equipment","businessId":"coffee_shop_1"}}"#,
        )
        .unwrap();
        assert_eq!(
            a,
            Action::PurchaseUpgrade {
                upgrade_type: "equipment".into(),
                business_id: "coffee_shop_1".into()
            }
        );
        let day: Action = serde_json::from_str(r#"{"type":"ADVANCE_DAY"}"#).unwrap();
        assert_eq!(day, Action::AdvanceDay);
    }

    #[test]
    fn progress_metric_names() {
        let a: Action = serde_json::from_str(
            r#"{"type":"UPDATE_SPECIAL_EVENT_PROGRESS","payload":{"eventId":"x","progressType":"greenInvestment","amount":5}}"#,
        )
        .unwrap();
        assert!(matches!(
            a,
            Action::UpdateSpecialEventProgress {
                progress_type: ProgressMetric::GreenInvestment,
                amount: 5,
                ..
            }
        ));
        assert_eq!(a.name(), "UPDATE_SPECIAL_EVENT_PROGRESS");
    }
}
