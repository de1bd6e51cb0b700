use std::sync::Arc;

use pickup_core::domain::{
    entities::paypal_plans::InsertPaypalPlanEntity,
    repositories::paypal_plans::PaypalPlanRepository,
    value_objects::{enums::subscription_plans::SubscriptionPlan, plans::plan_config},
};
use tracing::{error, info};

use crate::usecases::{
    billing_errors::{BillingError, BillingResult},
    paypal_gateway::PayPalGateway,
};

/// Lazily creates the PayPal product and billing plan for a recurring tier and memoizes the
/// ids in `paypal_plans`.
pub struct PlanProvisioningUseCase<P, G>
where
    P: PaypalPlanRepository + Send + Sync + 'static,
    G: PayPalGateway + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    paypal: Arc<G>,
}

impl<P, G> PlanProvisioningUseCase<P, G>
where
    P: PaypalPlanRepository + Send + Sync + 'static,
    G: PayPalGateway + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>, paypal: Arc<G>) -> Self {
        Self { plan_repo, paypal }
    }

    pub async fn ensure_plan_provisioned(
        &self,
        access_token: &str,
        plan: SubscriptionPlan,
    ) -> BillingResult<String> {
        let config = plan_config(plan).ok_or_else(|| {
            BillingError::InvalidArgument(format!("{} is not a recurring plan", plan))
        })?;

        if let Some(existing) = self
            .plan_repo
            .find_by_plan(plan)
            .await
            .map_err(|err| BillingError::PlanCache("read", err))?
        {
            return Ok(existing.paypal_plan_id);
        }

        info!(plan = %plan, "plan_provisioning: creating paypal product and billing plan");

        let product_id = self
            .paypal
            .create_product(access_token, config)
            .await
            .map_err(|err| {
                error!(plan = %plan, error = ?err, "plan_provisioning: product creation failed");
                BillingError::from_provisioning_error(err)
            })?;

        let paypal_plan_id = self
            .paypal
            .create_billing_plan(access_token, &product_id, config)
            .await
            .map_err(|err| {
                error!(plan = %plan, %product_id, error = ?err, "plan_provisioning: billing plan creation failed");
                BillingError::from_provisioning_error(err)
            })?;

        let stored = self
            .plan_repo
            .insert_if_absent(InsertPaypalPlanEntity {
                plan_key: plan.to_string(),
                paypal_product_id: product_id,
                paypal_plan_id: paypal_plan_id.clone(),
                name: config.name.to_string(),
                amount_minor: config.amount_minor,
                currency: config.currency.to_string(),
            })
            .await
            .map_err(|err| BillingError::PlanCache("store", err))?;

        if stored.paypal_plan_id != paypal_plan_id {
            // Lost a cold-start race; the plan created here stays orphaned on PayPal.
            info!(
                plan = %plan,
                orphaned_plan_id = %paypal_plan_id,
                stored_plan_id = %stored.paypal_plan_id,
                "plan_provisioning: another request provisioned the plan first"
            );
        } else {
            info!(plan = %plan, paypal_plan_id = %stored.paypal_plan_id, "plan_provisioning: plan cached");
        }

        Ok(stored.paypal_plan_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::paypal_gateway::MockPayPalGateway;
    use anyhow::anyhow;
    use chrono::Utc;
    use mockall::predicate::eq;
    use pickup_core::{
        domain::{
            entities::paypal_plans::PaypalPlanEntity,
            repositories::paypal_plans::MockPaypalPlanRepository,
        },
        payments::paypal_client::PayPalError,
    };

    fn stored_plan(paypal_plan_id: &str) -> PaypalPlanEntity {
        PaypalPlanEntity {
            plan_key: "organizer_pro".to_string(),
            paypal_product_id: "PROD-1".to_string(),
            paypal_plan_id: paypal_plan_id.to_string(),
            name: "Organizer Pro".to_string(),
            amount_minor: 1999,
            currency: "USD".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn cached_plan_skips_paypal() {
        let mut plan_repo = MockPaypalPlanRepository::new();
        plan_repo
            .expect_find_by_plan()
            .with(eq(SubscriptionPlan::OrganizerPro))
            .times(1)
            .returning(|_| Ok(Some(stored_plan("P-CACHED"))));
        plan_repo.expect_insert_if_absent().times(0);

        let mut paypal = MockPayPalGateway::new();
        paypal.expect_create_product().times(0);
        paypal.expect_create_billing_plan().times(0);

        let usecase = PlanProvisioningUseCase::new(Arc::new(plan_repo), Arc::new(paypal));
        let plan_id = usecase
            .ensure_plan_provisioned("token", SubscriptionPlan::OrganizerPro)
            .await
            .unwrap();

        assert_eq!(plan_id, "P-CACHED");
    }

    #[tokio::test]
    async fn cold_start_creates_product_then_plan_and_persists() {
        let mut plan_repo = MockPaypalPlanRepository::new();
        plan_repo.expect_find_by_plan().returning(|_| Ok(None));
        plan_repo
            .expect_insert_if_absent()
            .withf(|row| {
                row.plan_key == "organizer_pro"
                    && row.paypal_product_id == "PROD-1"
                    && row.paypal_plan_id == "P-NEW"
                    && row.amount_minor == 1999
                    && row.currency == "USD"
            })
            .times(1)
            .returning(|_| Ok(stored_plan("P-NEW")));

        let mut paypal = MockPayPalGateway::new();
        paypal
            .expect_create_product()
            .withf(|token, config| token == "token" && config.name == "Organizer Pro")
            .times(1)
            .returning(|_, _| Ok("PROD-1".to_string()));
        paypal
            .expect_create_billing_plan()
            .withf(|_, product_id, _| product_id == "PROD-1")
            .times(1)
            .returning(|_, _, _| Ok("P-NEW".to_string()));

        let usecase = PlanProvisioningUseCase::new(Arc::new(plan_repo), Arc::new(paypal));
        let plan_id = usecase
            .ensure_plan_provisioned("token", SubscriptionPlan::OrganizerPro)
            .await
            .unwrap();

        assert_eq!(plan_id, "P-NEW");
    }

    #[tokio::test]
    async fn concurrent_cold_start_returns_stored_plan() {
        let mut plan_repo = MockPaypalPlanRepository::new();
        plan_repo.expect_find_by_plan().returning(|_| Ok(None));
        plan_repo
            .expect_insert_if_absent()
            .returning(|_| Ok(stored_plan("P-WINNER")));

        let mut paypal = MockPayPalGateway::new();
        paypal
            .expect_create_product()
            .returning(|_, _| Ok("PROD-2".to_string()));
        paypal
            .expect_create_billing_plan()
            .returning(|_, _, _| Ok("P-LOSER".to_string()));

        let usecase = PlanProvisioningUseCase::new(Arc::new(plan_repo), Arc::new(paypal));
        let plan_id = usecase
            .ensure_plan_provisioned("token", SubscriptionPlan::OrganizerPro)
            .await
            .unwrap();

        assert_eq!(plan_id, "P-WINNER");
    }

    #[tokio::test]
    async fn product_failure_aborts_without_persisting() {
        let mut plan_repo = MockPaypalPlanRepository::new();
        plan_repo.expect_find_by_plan().returning(|_| Ok(None));
        plan_repo.expect_insert_if_absent().times(0);

        let mut paypal = MockPayPalGateway::new();
        paypal.expect_create_product().returning(|_, _| {
            Err(PayPalError::Api {
                context: "create product",
                status: axum::http::StatusCode::BAD_REQUEST,
                message: "PayPal Error: INVALID_REQUEST.".to_string(),
                body: "{}".to_string(),
            })
        });
        paypal.expect_create_billing_plan().times(0);

        let usecase = PlanProvisioningUseCase::new(Arc::new(plan_repo), Arc::new(paypal));
        let err = usecase
            .ensure_plan_provisioned("token", SubscriptionPlan::ProPlayer)
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::UpstreamProvisioning(_)));
    }

    #[tokio::test]
    async fn boost_is_not_provisionable() {
        let mut plan_repo = MockPaypalPlanRepository::new();
        plan_repo.expect_find_by_plan().times(0);

        let usecase =
            PlanProvisioningUseCase::new(Arc::new(plan_repo), Arc::new(MockPayPalGateway::new()));
        let err = usecase
            .ensure_plan_provisioned("token", SubscriptionPlan::BoostGame)
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn cache_read_failure_names_the_plan_cache() {
        let mut plan_repo = MockPaypalPlanRepository::new();
        plan_repo
            .expect_find_by_plan()
            .returning(|_| Err(anyhow!("connection refused")));
        plan_repo.expect_insert_if_absent().times(0);

        let mut paypal = MockPayPalGateway::new();
        paypal.expect_create_product().times(0);

        let usecase = PlanProvisioningUseCase::new(Arc::new(plan_repo), Arc::new(paypal));
        let err = usecase
            .ensure_plan_provisioned("token", SubscriptionPlan::OrganizerPro)
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::PlanCache("read", _)));
        assert_eq!(err.to_string(), "Failed to read cached PayPal plan");
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cache_store_failure_names_the_plan_cache() {
        let mut plan_repo = MockPaypalPlanRepository::new();
        plan_repo.expect_find_by_plan().returning(|_| Ok(None));
        plan_repo
            .expect_insert_if_absent()
            .returning(|_| Err(anyhow!("connection reset")));

        let mut paypal = MockPayPalGateway::new();
        paypal
            .expect_create_product()
            .returning(|_, _| Ok("PROD-1".to_string()));
        paypal
            .expect_create_billing_plan()
            .returning(|_, _, _| Ok("P-1".to_string()));

        let usecase = PlanProvisioningUseCase::new(Arc::new(plan_repo), Arc::new(paypal));
        let err = usecase
            .ensure_plan_provisioned("token", SubscriptionPlan::ProPlayer)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to store cached PayPal plan");
    }
}
