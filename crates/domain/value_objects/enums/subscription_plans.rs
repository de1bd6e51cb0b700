use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// What a subscription record was bought for. `BoostGame` is the one-time payment path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    ProPlayer,
    OrganizerPro,
    BoostGame,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::ProPlayer => "pro_player",
            SubscriptionPlan::OrganizerPro => "organizer_pro",
            SubscriptionPlan::BoostGame => "boost_game",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pro_player" => Some(SubscriptionPlan::ProPlayer),
            "organizer_pro" => Some(SubscriptionPlan::OrganizerPro),
            "boost_game" => Some(SubscriptionPlan::BoostGame),
            _ => None,
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, SubscriptionPlan::BoostGame)
    }
}

impl Display for SubscriptionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
