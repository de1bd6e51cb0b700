use async_trait::async_trait;
use pickup_core::{
    domain::value_objects::plans::SubscriptionPlanConfig,
    payments::{
        paypal_client::{PayPalClient, PayPalError},
        paypal_types::{CreatedCheckout, OneTimeOrder, TransmissionHeaders},
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PayPalGateway: Send + Sync {
    async fn access_token(&self) -> Result<String, PayPalError>;

    async fn create_product(
        &self,
        access_token: &str,
        config: &SubscriptionPlanConfig,
    ) -> Result<String, PayPalError>;

    async fn create_billing_plan(
        &self,
        access_token: &str,
        product_id: &str,
        config: &SubscriptionPlanConfig,
    ) -> Result<String, PayPalError>;

    async fn create_order(
        &self,
        access_token: &str,
        order: &OneTimeOrder,
    ) -> Result<CreatedCheckout, PayPalError>;

    async fn create_subscription(
        &self,
        access_token: &str,
        paypal_plan_id: &str,
    ) -> Result<CreatedCheckout, PayPalError>;

    async fn verify_webhook_signature(
        &self,
        access_token: &str,
        webhook_id: &str,
        headers: &TransmissionHeaders,
        raw_event: &str,
    ) -> Result<bool, PayPalError>;
}

#[async_trait]
impl PayPalGateway for PayPalClient {
    async fn access_token(&self) -> Result<String, PayPalError> {
        self.access_token().await
    }

    async fn create_product(
        &self,
        access_token: &str,
        config: &SubscriptionPlanConfig,
    ) -> Result<String, PayPalError> {
        self.create_product(access_token, config).await
    }

    async fn create_billing_plan(
        &self,
        access_token: &str,
        product_id: &str,
        config: &SubscriptionPlanConfig,
    ) -> Result<String, PayPalError> {
        self.create_billing_plan(access_token, product_id, config)
            .await
    }

    async fn create_order(
        &self,
        access_token: &str,
        order: &OneTimeOrder,
    ) -> Result<CreatedCheckout, PayPalError> {
        self.create_order(access_token, order).await
    }

    async fn create_subscription(
        &self,
        access_token: &str,
        paypal_plan_id: &str,
    ) -> Result<CreatedCheckout, PayPalError> {
        self.create_subscription(access_token, paypal_plan_id).await
    }

    async fn verify_webhook_signature(
        &self,
        access_token: &str,
        webhook_id: &str,
        headers: &TransmissionHeaders,
        raw_event: &str,
    ) -> Result<bool, PayPalError> {
        self.verify_webhook_signature(access_token, webhook_id, headers, raw_event)
            .await
    }
}
