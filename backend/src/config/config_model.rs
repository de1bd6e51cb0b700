use std::time::Duration;

use pickup_core::payments::paypal_client::{PayPalClientConfig, PayPalCredentials};

use crate::config::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub stage: Stage,
    pub backend_server: BackendServer,
    pub database: Database,
    pub supabase: Supabase,
    pub paypal: PayPal,
    pub app: App,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    /// MiB
    pub body_limit: u64,
    /// Seconds
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Supabase {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct PayPal {
    /// Absent credentials are reported per request rather than at startup.
    pub credentials: Option<PayPalCredentials>,
    pub base_url: String,
    pub webhook_verification: WebhookVerification,
    pub timeout_secs: u64,
    pub brand_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookVerification {
    /// Every delivery is checked against PayPal's verify-webhook-signature API.
    Verify { webhook_id: String },
    /// Explicit opt-in for local work against the sandbox; refused in production.
    Skip,
}

#[derive(Debug, Clone)]
pub struct App {
    /// Base for the return/cancel URLs PayPal redirects to after checkout.
    pub url: String,
}

impl DotEnvyConfig {
    pub fn paypal_client_config(&self) -> PayPalClientConfig {
        PayPalClientConfig {
            credentials: self.paypal.credentials.clone(),
            base_url: self.paypal.base_url.clone(),
            app_url: self.app.url.clone(),
            brand_name: self.paypal.brand_name.clone(),
            timeout: Duration::from_secs(self.paypal.timeout_secs),
        }
    }
}
