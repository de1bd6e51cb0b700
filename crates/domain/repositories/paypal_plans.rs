use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::{
    entities::paypal_plans::{InsertPaypalPlanEntity, PaypalPlanEntity},
    value_objects::enums::subscription_plans::SubscriptionPlan,
};

#[automock]
#[async_trait]
pub trait PaypalPlanRepository {
    async fn find_by_plan(&self, plan: SubscriptionPlan) -> Result<Option<PaypalPlanEntity>>;

    /// Inserts unless a row for the plan key already exists, then returns whichever row is
    /// stored. Concurrent first requests converge on a single cached plan.
    async fn insert_if_absent(&self, plan: InsertPaypalPlanEntity) -> Result<PaypalPlanEntity>;
}
