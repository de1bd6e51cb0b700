use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
    routing::post,
};
use pickup_core::{
    domain::repositories::{paypal_plans::PaypalPlanRepository, subscriptions::SubscriptionRepository},
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{paypal_plans::PaypalPlanPostgres, subscriptions::SubscriptionPostgres},
    },
    payments::paypal_client::PayPalClient,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::AuthUser,
    axum_http::error_responses::ApiError,
    usecases::{paypal_checkout::PayPalCheckoutUseCase, paypal_gateway::PayPalGateway},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub amount: f64,
    pub game_id: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub plan: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub success: bool,
    pub order_id: String,
    pub approval_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionResponse {
    pub success: bool,
    pub subscription_id: String,
    pub approval_url: String,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, paypal: Arc<PayPalClient>) -> Router {
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let plan_repository = PaypalPlanPostgres::new(Arc::clone(&db_pool));
    let checkout_usecase = PayPalCheckoutUseCase::new(
        Arc::new(subscription_repository),
        Arc::new(plan_repository),
        paypal,
    );

    Router::new()
        .route(
            "/create-paypal-payment",
            post(create_paypal_payment::<SubscriptionPostgres, PaypalPlanPostgres, PayPalClient>),
        )
        .route(
            "/create-paypal-subscription",
            post(create_paypal_subscription::<SubscriptionPostgres, PaypalPlanPostgres, PayPalClient>),
        )
        .with_state(Arc::new(checkout_usecase))
}

pub async fn create_paypal_payment<S, P, G>(
    State(checkout_usecase): State<Arc<PayPalCheckoutUseCase<S, P, G>>>,
    auth: AuthUser,
    payload: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PaypalPlanRepository + Send + Sync + 'static,
    G: PayPalGateway + Send + Sync + 'static,
{
    let Json(request) = payload?;

    let checkout = checkout_usecase
        .create_one_time_payment(auth.user_id, request.amount, request.game_id, request.description)
        .await?;

    Ok(Json(CreatePaymentResponse {
        success: true,
        order_id: checkout.id,
        approval_url: checkout.approval_url,
    }))
}

pub async fn create_paypal_subscription<S, P, G>(
    State(checkout_usecase): State<Arc<PayPalCheckoutUseCase<S, P, G>>>,
    auth: AuthUser,
    payload: Result<Json<CreateSubscriptionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PaypalPlanRepository + Send + Sync + 'static,
    G: PayPalGateway + Send + Sync + 'static,
{
    let Json(request) = payload?;

    let checkout = checkout_usecase
        .create_subscription(auth.user_id, &request.plan)
        .await?;

    Ok(Json(CreateSubscriptionResponse {
        success: true,
        subscription_id: checkout.id,
        approval_url: checkout.approval_url,
    }))
}
