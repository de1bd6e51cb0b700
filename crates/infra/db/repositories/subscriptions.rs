use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{OptionalExtension, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::subscriptions},
};
use domain::{
    entities::subscriptions::{SubscriptionEntity, UpdateSubscriptionStatusEntity},
    repositories::subscriptions::SubscriptionRepository,
    value_objects::{
        enums::{subscription_plans::SubscriptionPlan, subscription_statuses::SubscriptionStatus},
        subscriptions::{ExternalRef, NewSubscriptionModel, SubscriptionModel},
    },
};

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn insert_pending(&self, subscription: NewSubscriptionModel) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let subscription_id = insert_into(subscriptions::table)
            .values(&subscription.to_entity())
            .returning(subscriptions::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(subscription_id)
    }

    async fn update_status_by_external_ref(
        &self,
        external_ref: ExternalRef,
        status: SubscriptionStatus,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let changeset = UpdateSubscriptionStatusEntity {
            status: status.to_string(),
            updated_at: Utc::now(),
            expires_at,
        };

        let affected = match external_ref {
            ExternalRef::Order(order_id) => update(subscriptions::table)
                .filter(subscriptions::paypal_order_id.eq(order_id))
                .set(&changeset)
                .execute(&mut conn)?,
            ExternalRef::Subscription(subscription_id) => update(subscriptions::table)
                .filter(subscriptions::paypal_subscription_id.eq(subscription_id))
                .set(&changeset)
                .execute(&mut conn)?,
        };

        Ok(affected)
    }

    async fn find_latest_active(
        &self,
        user_id: Uuid,
        plan: SubscriptionPlan,
    ) -> Result<Option<SubscriptionModel>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = subscriptions::table
            .filter(subscriptions::user_id.eq(user_id))
            .filter(subscriptions::plan.eq(plan.as_str()))
            .filter(subscriptions::status.eq(SubscriptionStatus::Active.as_str()))
            .order(subscriptions::created_at.desc())
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        row.map(SubscriptionModel::try_from).transpose()
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<SubscriptionModel>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = subscriptions::table
            .filter(subscriptions::user_id.eq(user_id))
            .order(subscriptions::created_at.desc())
            .select(SubscriptionEntity::as_select())
            .load::<SubscriptionEntity>(&mut conn)?;

        rows.into_iter().map(SubscriptionModel::try_from).collect()
    }
}
