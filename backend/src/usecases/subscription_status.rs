use std::sync::Arc;

use chrono::Utc;
use pickup_core::domain::{
    repositories::subscriptions::SubscriptionRepository,
    value_objects::{
        enums::subscription_plans::SubscriptionPlan,
        subscriptions::{FeatureAccess, SubscriptionDto},
    },
};
use tracing::error;
use uuid::Uuid;

use crate::usecases::billing_errors::{BillingError, BillingResult};

pub struct SubscriptionStatusUseCase<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
}

impl<S> SubscriptionStatusUseCase<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>) -> Self {
        Self { subscription_repo }
    }

    /// Recomputed on every call; a lapsed expiry wins over a stale `active` status.
    pub async fn has_active_subscription(
        &self,
        user_id: Uuid,
        plan: SubscriptionPlan,
    ) -> BillingResult<bool> {
        let latest = self
            .subscription_repo
            .find_latest_active(user_id, plan)
            .await
            .map_err(|err| {
                error!(%user_id, plan = %plan, error = ?err, "subscription_status: lookup failed");
                BillingError::Internal(err)
            })?;

        Ok(latest.is_some_and(|subscription| subscription.is_entitled_at(Utc::now())))
    }

    pub async fn list_subscriptions(&self, user_id: Uuid) -> BillingResult<Vec<SubscriptionDto>> {
        let subscriptions = self
            .subscription_repo
            .list_by_user(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, error = ?err, "subscription_status: listing failed");
                BillingError::Internal(err)
            })?;

        Ok(subscriptions.into_iter().map(SubscriptionDto::from).collect())
    }

    pub async fn feature_access(&self, user_id: Uuid) -> BillingResult<FeatureAccess> {
        let is_pro_player = self
            .has_active_subscription(user_id, SubscriptionPlan::ProPlayer)
            .await?;
        let is_organizer_pro = self
            .has_active_subscription(user_id, SubscriptionPlan::OrganizerPro)
            .await?;

        Ok(FeatureAccess::from_entitlements(is_pro_player, is_organizer_pro))
    }
}
