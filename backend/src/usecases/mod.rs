pub mod billing_errors;
pub mod paypal_checkout;
pub mod paypal_gateway;
pub mod paypal_webhook;
pub mod plan_provisioning;
pub mod subscription_status;
