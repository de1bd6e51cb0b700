pub mod auth;
pub mod axum_http;
pub mod config;
pub mod usecases;

use std::sync::Arc;

use anyhow::{Context, Result};
use pickup_core::{infra::db::postgres::postgres_connection, payments::paypal_client::PayPalClient};
use tracing::{info, warn};

use crate::config::config_model::WebhookVerification;

pub async fn run() -> Result<()> {
    let dotenvy_env = config::config_loader::load()?;
    info!(stage = %dotenvy_env.stage, "ENV has been loaded");

    if dotenvy_env.paypal.credentials.is_none() {
        warn!("PayPal credentials are not configured; checkout requests will be rejected");
    }
    if dotenvy_env.paypal.webhook_verification == WebhookVerification::Skip {
        warn!("PayPal webhook signature verification is disabled");
    }

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)
        .context("failed to build postgres pool")?;
    info!("Postgres connection has been established");

    let paypal_client = PayPalClient::new(dotenvy_env.paypal_client_config())?;

    axum_http::http_serve::start(
        Arc::new(dotenvy_env),
        Arc::new(postgres_pool),
        Arc::new(paypal_client),
    )
    .await?;

    Ok(())
}
