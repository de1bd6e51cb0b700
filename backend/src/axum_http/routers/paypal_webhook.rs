use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
};
use pickup_core::{
    domain::repositories::subscriptions::SubscriptionRepository,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::subscriptions::SubscriptionPostgres,
    },
    payments::{paypal_client::PayPalClient, paypal_types::TransmissionHeaders},
};
use serde_json::json;
use tracing::debug;

use crate::{
    axum_http::error_responses::ApiError,
    config::config_model::WebhookVerification,
    usecases::{paypal_gateway::PayPalGateway, paypal_webhook::PayPalWebhookUseCase},
};

/// No caller auth here: PayPal's signature headers are checked by the usecase.
pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    paypal: Arc<PayPalClient>,
    verification: WebhookVerification,
) -> Router {
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let webhook_usecase =
        PayPalWebhookUseCase::new(Arc::new(subscription_repository), paypal, verification);

    Router::new()
        .route(
            "/paypal-webhook",
            post(paypal_webhook::<SubscriptionPostgres, PayPalClient>),
        )
        .with_state(Arc::new(webhook_usecase))
}

pub async fn paypal_webhook<S, G>(
    State(webhook_usecase): State<Arc<PayPalWebhookUseCase<S, G>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    G: PayPalGateway + Send + Sync + 'static,
{
    let outcome = webhook_usecase
        .handle(TransmissionHeaders::from_headers(&headers), &body)
        .await?;
    debug!(?outcome, "paypal_webhook: delivery handled");

    Ok(Json(json!({ "success": true })))
}
