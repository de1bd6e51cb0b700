use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::{
    enums::{subscription_plans::SubscriptionPlan, subscription_statuses::SubscriptionStatus},
    subscriptions::{ExternalRef, NewSubscriptionModel, SubscriptionModel},
};

#[automock]
#[async_trait]
pub trait SubscriptionRepository {
    async fn insert_pending(&self, subscription: NewSubscriptionModel) -> Result<Uuid>;

    /// Conditional update keyed by the PayPal id. Returns the number of rows touched so
    /// callers can tell "no matching record" apart from success.
    async fn update_status_by_external_ref(
        &self,
        external_ref: ExternalRef,
        status: SubscriptionStatus,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<usize>;

    async fn find_latest_active(
        &self,
        user_id: Uuid,
        plan: SubscriptionPlan,
    ) -> Result<Option<SubscriptionModel>>;

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<SubscriptionModel>>;
}
