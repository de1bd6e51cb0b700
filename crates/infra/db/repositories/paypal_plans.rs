use anyhow::Result;
use async_trait::async_trait;
use diesel::{OptionalExtension, RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::paypal_plans},
};
use domain::{
    entities::paypal_plans::{InsertPaypalPlanEntity, PaypalPlanEntity},
    repositories::paypal_plans::PaypalPlanRepository,
    value_objects::enums::subscription_plans::SubscriptionPlan,
};

pub struct PaypalPlanPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaypalPlanPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaypalPlanRepository for PaypalPlanPostgres {
    async fn find_by_plan(&self, plan: SubscriptionPlan) -> Result<Option<PaypalPlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = paypal_plans::table
            .find(plan.as_str())
            .select(PaypalPlanEntity::as_select())
            .first::<PaypalPlanEntity>(&mut conn)
            .optional()?;

        Ok(row)
    }

    async fn insert_if_absent(&self, plan: InsertPaypalPlanEntity) -> Result<PaypalPlanEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        insert_into(paypal_plans::table)
            .values(&plan)
            .on_conflict(paypal_plans::plan_key)
            .do_nothing()
            .execute(&mut conn)?;

        let stored = paypal_plans::table
            .find(plan.plan_key.as_str())
            .select(PaypalPlanEntity::as_select())
            .first::<PaypalPlanEntity>(&mut conn)?;

        Ok(stored)
    }
}
