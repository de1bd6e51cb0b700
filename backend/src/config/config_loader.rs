use anyhow::{Context, Result, bail};
use pickup_core::payments::paypal_client::{PayPalCredentials, SANDBOX_BASE_URL};

use super::config_model::{
    App, BackendServer, Database, DotEnvyConfig, PayPal, Supabase, WebhookVerification,
};
use crate::config::stage::Stage;

const DEFAULT_APP_URL: &str = "exp://localhost:8081";
const DEFAULT_BRAND_NAME: &str = "Football Organizer";
const DEFAULT_PAYPAL_TIMEOUT_SECS: u64 = 10;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    load_from(|key| std::env::var(key).ok())
}

/// Builds the config from any key lookup, so tests never touch the process environment.
pub fn load_from<F>(lookup: F) -> Result<DotEnvyConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |key: &str| -> Result<String> {
        lookup(key)
            .filter(|value| !value.trim().is_empty())
            .with_context(|| format!("{} is invalid", key))
    };
    let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    let stage = Stage::try_from(&optional("STAGE").unwrap_or_default())?;

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?
            .parse()
            .context("SERVER_PORT_BACKEND is invalid")?,
        body_limit: required("SERVER_BODY_LIMIT")?
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: required("SERVER_TIMEOUT")?
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
    };

    let supabase = Supabase {
        jwt_secret: required("SUPABASE_JWT_SECRET")?,
    };

    let credentials = match (optional("PAYPAL_CLIENT_ID"), optional("PAYPAL_SECRET")) {
        (Some(client_id), Some(secret)) => Some(PayPalCredentials { client_id, secret }),
        _ => None,
    };

    let webhook_verification = match (
        optional("PAYPAL_WEBHOOK_VERIFICATION")
            .map(|mode| mode.trim().to_ascii_lowercase())
            .as_deref(),
        optional("PAYPAL_WEBHOOK_ID"),
    ) {
        (Some("skip"), _) if stage == Stage::Production => {
            bail!("PAYPAL_WEBHOOK_VERIFICATION=skip is not allowed in production")
        }
        (Some("skip"), _) => WebhookVerification::Skip,
        (None | Some("verify"), Some(webhook_id)) => WebhookVerification::Verify { webhook_id },
        (None | Some("verify"), None) => {
            bail!("PAYPAL_WEBHOOK_ID is invalid (set PAYPAL_WEBHOOK_VERIFICATION=skip to opt out locally)")
        }
        (Some(other), _) => bail!("PAYPAL_WEBHOOK_VERIFICATION is invalid: {}", other),
    };

    let timeout_secs = match optional("PAYPAL_TIMEOUT_SECS") {
        Some(raw) => raw.parse().context("PAYPAL_TIMEOUT_SECS is invalid")?,
        None => DEFAULT_PAYPAL_TIMEOUT_SECS,
    };

    let paypal = PayPal {
        credentials,
        base_url: optional("PAYPAL_BASE_URL").unwrap_or_else(|| SANDBOX_BASE_URL.to_string()),
        webhook_verification,
        timeout_secs,
        brand_name: optional("PAYPAL_BRAND_NAME").unwrap_or_else(|| DEFAULT_BRAND_NAME.to_string()),
    };

    let app = App {
        url: optional("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.to_string()),
    };

    Ok(DotEnvyConfig {
        stage,
        backend_server,
        database,
        supabase,
        paypal,
        app,
    })
}
