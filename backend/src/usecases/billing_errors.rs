use axum::http::StatusCode;
use pickup_core::payments::paypal_client::PayPalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Failed to get PayPal access token: {0}")]
    UpstreamAuth(String),
    #[error("Failed to create PayPal plan: {0}")]
    UpstreamProvisioning(String),
    #[error("{0}")]
    Upstream(String),
    #[error("Failed to save payment record")]
    Persistence(#[source] anyhow::Error),
    #[error("Failed to {0} cached PayPal plan")]
    PlanCache(&'static str, #[source] anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BillingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BillingError::Configuration(_)
            | BillingError::InvalidArgument(_)
            | BillingError::UpstreamAuth(_)
            | BillingError::UpstreamProvisioning(_)
            | BillingError::Upstream(_)
            | BillingError::Persistence(_)
            | BillingError::PlanCache(..) => StatusCode::BAD_REQUEST,
            BillingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Token acquisition failures. Missing credentials are a configuration problem, not an
    /// upstream one.
    pub fn from_token_error(err: PayPalError) -> Self {
        match err {
            PayPalError::MissingCredentials => BillingError::Configuration(err.to_string()),
            other => BillingError::UpstreamAuth(other.to_string()),
        }
    }

    pub fn from_provisioning_error(err: PayPalError) -> Self {
        match &err {
            PayPalError::Api { body, .. } => {
                BillingError::UpstreamProvisioning(format!("{} (response: {})", err, body))
            }
            _ => BillingError::UpstreamProvisioning(err.to_string()),
        }
    }
}

impl From<PayPalError> for BillingError {
    fn from(err: PayPalError) -> Self {
        match err {
            PayPalError::MissingCredentials => BillingError::Configuration(err.to_string()),
            PayPalError::Auth(_) => BillingError::UpstreamAuth(err.to_string()),
            other => BillingError::Upstream(other.to_string()),
        }
    }
}

pub type BillingResult<T> = std::result::Result<T, BillingError>;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("{0}")]
    InvalidSignature(String),
    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl WebhookError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature(_) => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            WebhookError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type WebhookResult<T> = std::result::Result<T, WebhookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_is_configuration_error() {
        let err = BillingError::from_token_error(PayPalError::MissingCredentials);
        assert!(matches!(err, BillingError::Configuration(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn provisioning_error_keeps_response_body() {
        let err = BillingError::from_provisioning_error(PayPalError::Api {
            context: "create product",
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "PayPal Error: INVALID_PARAMETER_VALUE.".to_string(),
            body: r#"{"name":"UNPROCESSABLE_ENTITY"}"#.to_string(),
        });

        let message = err.to_string();
        assert!(message.contains("INVALID_PARAMETER_VALUE"));
        assert!(message.contains("UNPROCESSABLE_ENTITY"));
    }

    #[test]
    fn webhook_signature_failures_are_unauthorized() {
        let err = WebhookError::InvalidSignature("verification failed".to_string());
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }
}
