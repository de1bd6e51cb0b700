pub mod paypal_plans;
pub mod subscriptions;
