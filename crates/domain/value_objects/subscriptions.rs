use std::fmt::Display;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
    value_objects::{
        enums::{subscription_plans::SubscriptionPlan, subscription_statuses::SubscriptionStatus},
        money::major_from_minor,
    },
};

/// PayPal-side identity of a purchase: a one-time checkout order or a recurring subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExternalRef {
    Order(String),
    Subscription(String),
}

impl ExternalRef {
    pub fn order_id(&self) -> Option<&str> {
        match self {
            ExternalRef::Order(id) => Some(id),
            ExternalRef::Subscription(_) => None,
        }
    }

    pub fn subscription_id(&self) -> Option<&str> {
        match self {
            ExternalRef::Subscription(id) => Some(id),
            ExternalRef::Order(_) => None,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ExternalRef::Order(id) | ExternalRef::Subscription(id) => id,
        }
    }

    pub fn from_columns(order_id: Option<String>, subscription_id: Option<String>) -> Result<Self> {
        match (order_id, subscription_id) {
            (Some(order_id), None) => Ok(ExternalRef::Order(order_id)),
            (None, Some(subscription_id)) => Ok(ExternalRef::Subscription(subscription_id)),
            (Some(_), Some(_)) => Err(anyhow!("record carries both an order id and a subscription id")),
            (None, None) => Err(anyhow!("record carries neither an order id nor a subscription id")),
        }
    }
}

impl Display for ExternalRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExternalRef::Order(id) => write!(f, "order:{}", id),
            ExternalRef::Subscription(id) => write!(f, "subscription:{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionModel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: SubscriptionPlan,
    pub status: SubscriptionStatus,
    pub external_ref: ExternalRef,
    pub amount_minor: i64,
    pub currency: String,
    pub game_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SubscriptionModel {
    /// Active and not past its expiry. A stale `active` row whose expiry has passed does not
    /// grant access even if the cancellation webhook never arrived.
    pub fn is_entitled_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active
            && self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

impl TryFrom<SubscriptionEntity> for SubscriptionModel {
    type Error = anyhow::Error;

    fn try_from(value: SubscriptionEntity) -> Result<Self> {
        let plan = SubscriptionPlan::from_str(&value.plan)
            .ok_or_else(|| anyhow!("unknown plan `{}` on subscription {}", value.plan, value.id))?;
        let external_ref =
            ExternalRef::from_columns(value.paypal_order_id, value.paypal_subscription_id)
                .map_err(|err| err.context(format!("subscription {}", value.id)))?;

        Ok(Self {
            id: value.id,
            user_id: value.user_id,
            plan,
            status: SubscriptionStatus::from_str(&value.status),
            external_ref,
            amount_minor: value.amount_minor,
            currency: value.currency,
            game_id: value.game_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
            expires_at: value.expires_at,
        })
    }
}

/// A purchase attempt about to be persisted. Always starts out `pending`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubscriptionModel {
    pub user_id: Uuid,
    pub plan: SubscriptionPlan,
    pub external_ref: ExternalRef,
    pub amount_minor: i64,
    pub currency: String,
    pub game_id: Option<String>,
}

impl NewSubscriptionModel {
    pub fn to_entity(&self) -> InsertSubscriptionEntity {
        InsertSubscriptionEntity {
            user_id: self.user_id,
            plan: self.plan.to_string(),
            status: SubscriptionStatus::Pending.to_string(),
            paypal_order_id: self.external_ref.order_id().map(str::to_string),
            paypal_subscription_id: self.external_ref.subscription_id().map(str::to_string),
            amount_minor: self.amount_minor,
            currency: self.currency.clone(),
            game_id: self.game_id.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDto {
    pub id: Uuid,
    pub plan: SubscriptionPlan,
    pub status: SubscriptionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    pub amount: f64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<SubscriptionModel> for SubscriptionDto {
    fn from(value: SubscriptionModel) -> Self {
        Self {
            id: value.id,
            plan: value.plan,
            status: value.status,
            order_id: value.external_ref.order_id().map(str::to_string),
            subscription_id: value.external_ref.subscription_id().map(str::to_string),
            amount: major_from_minor(value.amount_minor),
            currency: value.currency,
            game_id: value.game_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
            expires_at: value.expires_at,
        }
    }
}

/// Monthly game quota for users without Organizer Pro.
pub const FREE_GAMES_PER_MONTH: i32 = 5;

/// Feature gates the mobile client renders from the user's entitlements.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeatureAccess {
    pub can_create_games: bool,
    pub can_boost_games: bool,
    pub can_see_advanced_stats: bool,
    pub can_send_messages: bool,
    /// `-1` means unlimited.
    pub max_games_per_month: i32,
    pub has_pro_player_badge: bool,
    pub has_organizer_pro_badge: bool,
}

impl FeatureAccess {
    pub fn from_entitlements(is_pro_player: bool, is_organizer_pro: bool) -> Self {
        Self {
            can_create_games: true,
            can_boost_games: is_organizer_pro,
            can_see_advanced_stats: is_pro_player || is_organizer_pro,
            can_send_messages: true,
            max_games_per_month: if is_organizer_pro { -1 } else { FREE_GAMES_PER_MONTH },
            has_pro_player_badge: is_pro_player,
            has_organizer_pro_badge: is_organizer_pro,
        }
    }
}
