pub mod paypal_client;
pub mod paypal_types;
