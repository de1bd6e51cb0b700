use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::subscriptions;

/// Raw row. Exactly one of `paypal_order_id` / `paypal_subscription_id` is set; the
/// domain model turns the pair into an `ExternalRef`.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscriptions)]
pub struct SubscriptionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: String,
    pub status: String,
    pub paypal_order_id: Option<String>,
    pub paypal_subscription_id: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub game_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = subscriptions)]
pub struct InsertSubscriptionEntity {
    pub user_id: Uuid,
    pub plan: String,
    pub status: String,
    pub paypal_order_id: Option<String>,
    pub paypal_subscription_id: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub game_id: Option<String>,
}

/// `expires_at: None` leaves the column untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = subscriptions)]
pub struct UpdateSubscriptionStatusEntity {
    pub status: String,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}
