use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    response::IntoResponse,
    routing::get,
};
use pickup_core::{
    domain::{
        repositories::subscriptions::SubscriptionRepository,
        value_objects::enums::subscription_plans::SubscriptionPlan,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::subscriptions::SubscriptionPostgres,
    },
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::AuthUser, axum_http::error_responses::ApiError,
    usecases::subscription_status::SubscriptionStatusUseCase,
};

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub plan: String,
}

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let status_usecase = SubscriptionStatusUseCase::new(Arc::new(subscription_repository));

    Router::new()
        .route("/", get(list_subscriptions::<SubscriptionPostgres>))
        .route("/status", get(subscription_status::<SubscriptionPostgres>))
        .route("/features", get(feature_access::<SubscriptionPostgres>))
        .with_state(Arc::new(status_usecase))
}

pub async fn list_subscriptions<S>(
    State(status_usecase): State<Arc<SubscriptionStatusUseCase<S>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    let subscriptions = status_usecase.list_subscriptions(auth.user_id).await?;

    Ok(Json(json!({ "success": true, "subscriptions": subscriptions })))
}

pub async fn subscription_status<S>(
    State(status_usecase): State<Arc<SubscriptionStatusUseCase<S>>>,
    auth: AuthUser,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let plan = SubscriptionPlan::from_str(&query.plan)
        .ok_or_else(|| ApiError::BadRequest("Invalid plan".to_string()))?;

    let active = status_usecase
        .has_active_subscription(auth.user_id, plan)
        .await?;

    Ok(Json(json!({ "success": true, "plan": plan, "active": active })))
}

pub async fn feature_access<S>(
    State(status_usecase): State<Arc<SubscriptionStatusUseCase<S>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    let features = status_usecase.feature_access(auth.user_id).await?;

    Ok(Json(json!({ "success": true, "features": features })))
}
