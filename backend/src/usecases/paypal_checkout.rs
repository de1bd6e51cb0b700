use std::sync::Arc;

use pickup_core::{
    domain::{
        repositories::{
            paypal_plans::PaypalPlanRepository, subscriptions::SubscriptionRepository,
        },
        value_objects::{
            enums::subscription_plans::SubscriptionPlan,
            money::{DEFAULT_CURRENCY, minor_from_major},
            plans::{BOOST_GAME_DESCRIPTION, plan_config},
            subscriptions::{ExternalRef, NewSubscriptionModel},
        },
    },
    payments::paypal_types::{CreatedCheckout, OneTimeOrder},
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::{
    billing_errors::{BillingError, BillingResult},
    paypal_gateway::PayPalGateway,
    plan_provisioning::PlanProvisioningUseCase,
};

pub struct PayPalCheckoutUseCase<S, P, G>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PaypalPlanRepository + Send + Sync + 'static,
    G: PayPalGateway + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    plan_provisioning: PlanProvisioningUseCase<P, G>,
    paypal: Arc<G>,
}

impl<S, P, G> PayPalCheckoutUseCase<S, P, G>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PaypalPlanRepository + Send + Sync + 'static,
    G: PayPalGateway + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>, plan_repo: Arc<P>, paypal: Arc<G>) -> Self {
        Self {
            subscription_repo,
            plan_provisioning: PlanProvisioningUseCase::new(plan_repo, Arc::clone(&paypal)),
            paypal,
        }
    }

    async fn access_token(&self) -> BillingResult<String> {
        self.paypal.access_token().await.map_err(|err| {
            error!(error = ?err, "paypal_checkout: failed to get access token");
            BillingError::from_token_error(err)
        })
    }

    /// One-time "boost" purchase. Validation happens before any outbound call.
    pub async fn create_one_time_payment(
        &self,
        user_id: Uuid,
        amount: f64,
        game_id: Option<String>,
        description: Option<String>,
    ) -> BillingResult<CreatedCheckout> {
        let amount_minor = match minor_from_major(amount) {
            Some(minor) if amount > 0.0 && minor >= 1 => minor,
            _ => {
                warn!(%user_id, amount, "paypal_checkout: rejected invalid amount");
                return Err(BillingError::InvalidArgument("Invalid amount".to_string()));
            }
        };

        let description = description
            .map(|description| description.trim().to_string())
            .filter(|description| !description.is_empty())
            .unwrap_or_else(|| BOOST_GAME_DESCRIPTION.to_string());

        let access_token = self.access_token().await?;

        let order = OneTimeOrder {
            amount_minor,
            currency: DEFAULT_CURRENCY.to_string(),
            description,
        };
        let checkout = self
            .paypal
            .create_order(&access_token, &order)
            .await
            .map_err(|err| {
                error!(%user_id, error = ?err, "paypal_checkout: order creation failed");
                BillingError::from(err)
            })?;

        info!(%user_id, order_id = %checkout.id, amount_minor, "paypal_checkout: order created");

        self.subscription_repo
            .insert_pending(NewSubscriptionModel {
                user_id,
                plan: SubscriptionPlan::BoostGame,
                external_ref: ExternalRef::Order(checkout.id.clone()),
                amount_minor,
                currency: order.currency,
                game_id,
            })
            .await
            .map_err(|err| {
                // The PayPal order already exists; it is left as is.
                error!(%user_id, order_id = %checkout.id, error = ?err, "paypal_checkout: failed to persist pending payment");
                BillingError::Persistence(err)
            })?;

        Ok(checkout)
    }

    pub async fn create_subscription(
        &self,
        user_id: Uuid,
        plan: &str,
    ) -> BillingResult<CreatedCheckout> {
        let (plan, config) = SubscriptionPlan::from_str(plan)
            .and_then(|plan| plan_config(plan).map(|config| (plan, config)))
            .ok_or_else(|| {
                warn!(%user_id, plan, "paypal_checkout: rejected unknown plan");
                BillingError::InvalidArgument("Invalid plan".to_string())
            })?;

        let access_token = self.access_token().await?;

        let paypal_plan_id = self
            .plan_provisioning
            .ensure_plan_provisioned(&access_token, plan)
            .await?;

        let checkout = self
            .paypal
            .create_subscription(&access_token, &paypal_plan_id)
            .await
            .map_err(|err| {
                error!(%user_id, plan = %plan, error = ?err, "paypal_checkout: subscription creation failed");
                BillingError::from(err)
            })?;

        info!(%user_id, plan = %plan, subscription_id = %checkout.id, "paypal_checkout: subscription created");

        self.subscription_repo
            .insert_pending(NewSubscriptionModel {
                user_id,
                plan,
                external_ref: ExternalRef::Subscription(checkout.id.clone()),
                amount_minor: config.amount_minor,
                currency: config.currency.to_string(),
                game_id: None,
            })
            .await
            .map_err(|err| {
                error!(%user_id, subscription_id = %checkout.id, error = ?err, "paypal_checkout: failed to persist pending subscription");
                BillingError::Persistence(err)
            })?;

        Ok(checkout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::paypal_gateway::MockPayPalGateway;
    use anyhow::anyhow;
    use pickup_core::{
        domain::repositories::{
            paypal_plans::MockPaypalPlanRepository, subscriptions::MockSubscriptionRepository,
        },
        payments::paypal_client::PayPalError,
    };

    fn usecase(
        subscription_repo: MockSubscriptionRepository,
        plan_repo: MockPaypalPlanRepository,
        paypal: MockPayPalGateway,
    ) -> PayPalCheckoutUseCase<MockSubscriptionRepository, MockPaypalPlanRepository, MockPayPalGateway>
    {
        PayPalCheckoutUseCase::new(Arc::new(subscription_repo), Arc::new(plan_repo), Arc::new(paypal))
    }

    fn checkout(id: &str) -> CreatedCheckout {
        CreatedCheckout {
            id: id.to_string(),
            approval_url: format!("https://www.sandbox.paypal.com/checkoutnow?token={}", id),
        }
    }

    #[tokio::test]
    async fn non_positive_amounts_make_no_outbound_calls() {
        for amount in [0.0, -5.0, 0.004, f64::NAN, f64::INFINITY] {
            let mut paypal = MockPayPalGateway::new();
            paypal.expect_access_token().times(0);
            paypal.expect_create_order().times(0);
            let mut subscription_repo = MockSubscriptionRepository::new();
            subscription_repo.expect_insert_pending().times(0);

            let err = usecase(subscription_repo, MockPaypalPlanRepository::new(), paypal)
                .create_one_time_payment(Uuid::new_v4(), amount, None, None)
                .await
                .unwrap_err();

            assert!(matches!(err, BillingError::InvalidArgument(_)), "amount {amount}");
        }
    }

    #[tokio::test]
    async fn boost_payment_persists_pending_order() {
        let user_id = Uuid::new_v4();

        let mut paypal = MockPayPalGateway::new();
        paypal
            .expect_access_token()
            .times(1)
            .returning(|| Ok("token".to_string()));
        paypal
            .expect_create_order()
            .withf(|token, order| {
                token == "token"
                    && order.amount_minor == 499
                    && order.currency == "USD"
                    && order.description == "Boost Game"
            })
            .times(1)
            .returning(|_, _| Ok(checkout("5O190127TN364715T")));

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_insert_pending()
            .withf(move |new| {
                new.user_id == user_id
                    && new.plan == SubscriptionPlan::BoostGame
                    && new.external_ref == ExternalRef::Order("5O190127TN364715T".to_string())
                    && new.amount_minor == 499
                    && new.game_id.as_deref() == Some("game-42")
            })
            .times(1)
            .returning(|_| Ok(Uuid::new_v4()));

        let created = usecase(subscription_repo, MockPaypalPlanRepository::new(), paypal)
            .create_one_time_payment(user_id, 4.99, Some("game-42".to_string()), Some("  ".to_string()))
            .await
            .unwrap();

        assert_eq!(created.id, "5O190127TN364715T");
        assert!(created.approval_url.contains("5O190127TN364715T"));
    }

    #[tokio::test]
    async fn missing_credentials_is_a_configuration_error() {
        let mut paypal = MockPayPalGateway::new();
        paypal
            .expect_access_token()
            .returning(|| Err(PayPalError::MissingCredentials));
        paypal.expect_create_order().times(0);

        let err = usecase(MockSubscriptionRepository::new(), MockPaypalPlanRepository::new(), paypal)
            .create_one_time_payment(Uuid::new_v4(), 4.99, None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::Configuration(_)));
    }

    #[tokio::test]
    async fn missing_approval_link_writes_nothing() {
        let mut paypal = MockPayPalGateway::new();
        paypal
            .expect_access_token()
            .returning(|| Ok("token".to_string()));
        paypal
            .expect_create_order()
            .returning(|_, _| Err(PayPalError::MissingApprovalLink));
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo.expect_insert_pending().times(0);

        let err = usecase(subscription_repo, MockPaypalPlanRepository::new(), paypal)
            .create_one_time_payment(Uuid::new_v4(), 4.99, None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::Upstream(_)));
        assert_eq!(err.to_string(), "No approval URL returned from PayPal");
    }

    #[tokio::test]
    async fn persistence_failure_after_order_is_surfaced() {
        let mut paypal = MockPayPalGateway::new();
        paypal
            .expect_access_token()
            .returning(|| Ok("token".to_string()));
        paypal
            .expect_create_order()
            .returning(|_, _| Ok(checkout("ORDER-1")));
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_insert_pending()
            .returning(|_| Err(anyhow!("connection refused")));

        let err = usecase(subscription_repo, MockPaypalPlanRepository::new(), paypal)
            .create_one_time_payment(Uuid::new_v4(), 4.99, None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::Persistence(_)));
    }

    #[tokio::test]
    async fn unknown_or_one_time_plan_is_rejected_before_paypal() {
        for plan in ["gold", "boost_game", ""] {
            let mut paypal = MockPayPalGateway::new();
            paypal.expect_access_token().times(0);

            let err = usecase(MockSubscriptionRepository::new(), MockPaypalPlanRepository::new(), paypal)
                .create_subscription(Uuid::new_v4(), plan)
                .await
                .unwrap_err();

            assert!(matches!(err, BillingError::InvalidArgument(_)), "plan {plan}");
        }
    }

    #[tokio::test]
    async fn organizer_pro_subscription_persists_pending_record() {
        let user_id = Uuid::new_v4();

        let mut paypal = MockPayPalGateway::new();
        paypal
            .expect_access_token()
            .times(1)
            .returning(|| Ok("token".to_string()));
        paypal
            .expect_create_product()
            .times(1)
            .returning(|_, _| Ok("PROD-1".to_string()));
        paypal
            .expect_create_billing_plan()
            .times(1)
            .returning(|_, _, _| Ok("P-ORG".to_string()));
        paypal
            .expect_create_subscription()
            .withf(|token, plan_id| token == "token" && plan_id == "P-ORG")
            .times(1)
            .returning(|_, _| Ok(checkout("I-BW452GLLEP1G")));

        let mut plan_repo = MockPaypalPlanRepository::new();
        plan_repo.expect_find_by_plan().returning(|_| Ok(None));
        plan_repo.expect_insert_if_absent().returning(|row| {
            Ok(pickup_core::domain::entities::paypal_plans::PaypalPlanEntity {
                plan_key: row.plan_key,
                paypal_product_id: row.paypal_product_id,
                paypal_plan_id: row.paypal_plan_id,
                name: row.name,
                amount_minor: row.amount_minor,
                currency: row.currency,
                created_at: chrono::Utc::now(),
            })
        });

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_insert_pending()
            .withf(move |new| {
                new.user_id == user_id
                    && new.plan == SubscriptionPlan::OrganizerPro
                    && new.external_ref == ExternalRef::Subscription("I-BW452GLLEP1G".to_string())
                    && new.amount_minor == 1999
                    && new.currency == "USD"
                    && new.game_id.is_none()
            })
            .times(1)
            .returning(|_| Ok(Uuid::new_v4()));

        let created = usecase(subscription_repo, plan_repo, paypal)
            .create_subscription(user_id, "organizer_pro")
            .await
            .unwrap();

        assert_eq!(created.id, "I-BW452GLLEP1G");
    }

    #[tokio::test]
    async fn paypal_error_envelope_is_surfaced() {
        let mut paypal = MockPayPalGateway::new();
        paypal
            .expect_access_token()
            .returning(|| Ok("token".to_string()));
        paypal.expect_create_subscription().returning(|_, _| {
            Err(PayPalError::Api {
                context: "create subscription",
                status: axum::http::StatusCode::UNPROCESSABLE_ENTITY,
                message: "PayPal Error: SUBSCRIPTION_STATUS_INVALID. Invalid subscription status."
                    .to_string(),
                body: "{}".to_string(),
            })
        });

        let mut plan_repo = MockPaypalPlanRepository::new();
        plan_repo.expect_find_by_plan().returning(|_| {
            Ok(Some(pickup_core::domain::entities::paypal_plans::PaypalPlanEntity {
                plan_key: "pro_player".to_string(),
                paypal_product_id: "PROD-1".to_string(),
                paypal_plan_id: "P-PRO".to_string(),
                name: "Pro Player".to_string(),
                amount_minor: 999,
                currency: "USD".to_string(),
                created_at: chrono::Utc::now(),
            }))
        });
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo.expect_insert_pending().times(0);

        let err = usecase(subscription_repo, plan_repo, paypal)
            .create_subscription(Uuid::new_v4(), "pro_player")
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "PayPal Error: SUBSCRIPTION_STATUS_INVALID. Invalid subscription status."
        );
    }
}
