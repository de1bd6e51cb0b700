use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use pickup_core::{
    domain::{
        repositories::subscriptions::SubscriptionRepository,
        value_objects::{
            enums::subscription_statuses::SubscriptionStatus, subscriptions::ExternalRef,
        },
    },
    payments::paypal_types::{
        EVENT_PAYMENT_CAPTURE_COMPLETED, EVENT_SUBSCRIPTION_ACTIVATED,
        EVENT_SUBSCRIPTION_CANCELLED, EVENT_SUBSCRIPTION_EXPIRED, PayPalWebhookEvent,
        TransmissionHeaders,
    },
};
use tracing::{debug, error, info, warn};

use crate::{
    config::config_model::WebhookVerification,
    usecases::{
        billing_errors::{WebhookError, WebhookResult},
        paypal_gateway::PayPalGateway,
    },
};

/// Entitlement window granted on activation when PayPal does not report the next billing time.
pub const DEFAULT_ACTIVATION_DAYS: i64 = 30;

/// The local state change a webhook event asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAction {
    Activate {
        subscription_id: String,
        expires_at: DateTime<Utc>,
    },
    Cancel {
        subscription_id: String,
    },
    CompleteOrder {
        order_id: String,
    },
    Ignore,
}

impl WebhookAction {
    /// Only the resources of handled event types are decoded; anything else is ignored
    /// whatever its shape.
    pub fn from_event(event: &PayPalWebhookEvent, now: DateTime<Utc>) -> serde_json::Result<Self> {
        let default_expiry = now + Duration::days(DEFAULT_ACTIVATION_DAYS);

        let action = match event.event_type.as_str() {
            EVENT_SUBSCRIPTION_ACTIVATED => {
                let resource = event.decode_resource()?;
                match resource.id.clone() {
                    Some(subscription_id) => WebhookAction::Activate {
                        subscription_id,
                        expires_at: resource.next_billing_time().unwrap_or(default_expiry),
                    },
                    None => WebhookAction::Ignore,
                }
            }
            EVENT_SUBSCRIPTION_CANCELLED | EVENT_SUBSCRIPTION_EXPIRED => {
                match event.decode_resource()?.id {
                    Some(subscription_id) => WebhookAction::Cancel { subscription_id },
                    None => WebhookAction::Ignore,
                }
            }
            EVENT_PAYMENT_CAPTURE_COMPLETED => {
                let resource = event.decode_resource()?;
                if let Some(agreement_id) = resource.billing_agreement_id.clone() {
                    // Renewal payment of a recurring subscription.
                    WebhookAction::Activate {
                        subscription_id: agreement_id,
                        expires_at: default_expiry,
                    }
                } else {
                    match resource.related_order_id() {
                        Some(order_id) => WebhookAction::CompleteOrder {
                            order_id: order_id.to_string(),
                        },
                        None => WebhookAction::Ignore,
                    }
                }
            }
            _ => WebhookAction::Ignore,
        };

        Ok(action)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Applied { rows: usize },
    NoMatchingRecord,
    Ignored,
}

pub struct PayPalWebhookUseCase<S, G>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    G: PayPalGateway + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    paypal: Arc<G>,
    verification: WebhookVerification,
}

impl<S, G> PayPalWebhookUseCase<S, G>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    G: PayPalGateway + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>, paypal: Arc<G>, verification: WebhookVerification) -> Self {
        Self {
            subscription_repo,
            paypal,
            verification,
        }
    }

    /// Verifies then reconciles one delivery. Nothing is written unless verification passed.
    pub async fn handle(
        &self,
        headers: Option<TransmissionHeaders>,
        body: &[u8],
    ) -> WebhookResult<WebhookOutcome> {
        let raw_event = std::str::from_utf8(body).map_err(|err| {
            warn!(error = %err, "paypal_webhook: body is not utf-8");
            WebhookError::InvalidPayload(err.to_string())
        })?;

        let event: PayPalWebhookEvent = serde_json::from_str(raw_event).map_err(|err| {
            warn!(error = %err, "paypal_webhook: body is not a webhook event");
            WebhookError::InvalidPayload(err.to_string())
        })?;

        self.verify(headers, raw_event).await?;

        info!(
            event_id = ?event.id,
            event_type = %event.event_type,
            resource_id = ?event.resource_id(),
            "paypal_webhook: event received"
        );

        let action = WebhookAction::from_event(&event, Utc::now()).map_err(|err| {
            warn!(event_type = %event.event_type, error = %err, "paypal_webhook: unexpected resource shape");
            WebhookError::InvalidPayload(err.to_string())
        })?;

        self.apply(action, &event).await
    }

    async fn verify(
        &self,
        headers: Option<TransmissionHeaders>,
        raw_event: &str,
    ) -> WebhookResult<()> {
        let webhook_id = match &self.verification {
            WebhookVerification::Verify { webhook_id } => webhook_id,
            WebhookVerification::Skip => {
                debug!("paypal_webhook: signature verification skipped by configuration");
                return Ok(());
            }
        };

        let headers = headers.ok_or_else(|| {
            warn!("paypal_webhook: missing transmission headers");
            WebhookError::InvalidSignature("Missing PayPal signature headers".to_string())
        })?;

        let access_token = self.paypal.access_token().await.map_err(|err| {
            error!(error = ?err, "paypal_webhook: failed to get access token for verification");
            WebhookError::InvalidSignature("Signature verification failed".to_string())
        })?;

        let verified = self
            .paypal
            .verify_webhook_signature(&access_token, webhook_id, &headers, raw_event)
            .await
            .map_err(|err| {
                error!(
                    transmission_id = %headers.transmission_id,
                    error = ?err,
                    "paypal_webhook: verification request failed"
                );
                WebhookError::InvalidSignature("Signature verification failed".to_string())
            })?;

        if !verified {
            warn!(transmission_id = %headers.transmission_id, "paypal_webhook: signature rejected");
            return Err(WebhookError::InvalidSignature(
                "Invalid webhook signature".to_string(),
            ));
        }

        Ok(())
    }

    async fn apply(
        &self,
        action: WebhookAction,
        event: &PayPalWebhookEvent,
    ) -> WebhookResult<WebhookOutcome> {
        let (external_ref, status, expires_at) = match action {
            WebhookAction::Activate {
                subscription_id,
                expires_at,
            } => (
                ExternalRef::Subscription(subscription_id),
                SubscriptionStatus::Active,
                Some(expires_at),
            ),
            WebhookAction::Cancel { subscription_id } => (
                ExternalRef::Subscription(subscription_id),
                SubscriptionStatus::Cancelled,
                None,
            ),
            WebhookAction::CompleteOrder { order_id } => (
                ExternalRef::Order(order_id),
                SubscriptionStatus::Completed,
                None,
            ),
            WebhookAction::Ignore => {
                info!(event_type = %event.event_type, "paypal_webhook: event ignored");
                return Ok(WebhookOutcome::Ignored);
            }
        };

        let rows = self
            .subscription_repo
            .update_status_by_external_ref(external_ref.clone(), status, expires_at)
            .await
            .map_err(|err| {
                error!(%external_ref, %status, error = ?err, "paypal_webhook: status update failed");
                WebhookError::Internal(err)
            })?;

        if rows == 0 {
            warn!(%external_ref, %status, event_type = %event.event_type, "paypal_webhook: no matching subscription record");
            return Ok(WebhookOutcome::NoMatchingRecord);
        }

        info!(%external_ref, %status, rows, "paypal_webhook: subscription updated");
        Ok(WebhookOutcome::Applied { rows })
    }
}
