pub mod paypal_checkout;
pub mod paypal_webhook;
pub mod subscriptions;
