use std::time::Duration;

use anyhow::Result;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{
    StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use thiserror::Error;
use tracing::{debug, error};

use crate::{
    domain::value_objects::{money::format_minor_amount, plans::SubscriptionPlanConfig},
    payments::paypal_types::{
        AccessTokenResponse, ApplicationContext, BillingCycle, CheckoutResponse,
        CreateBillingPlanRequest, CreateOrderRequest, CreateProductRequest,
        CreateSubscriptionRequest, CreatedCheckout, Frequency, Money, OneTimeOrder,
        PayPalErrorEnvelope, PaymentPreferences, PricingScheme, PurchaseUnit, ResourceIdResponse,
        TransmissionHeaders, VerifyWebhookSignatureRequest, VerifyWebhookSignatureResponse,
    },
};

pub const SANDBOX_BASE_URL: &str = "https://api-m.sandbox.paypal.com";

/// PayPal flags a billing plan's subscription as failed after this many missed payments.
const PAYMENT_FAILURE_THRESHOLD: u32 = 3;

#[derive(Debug, Error)]
pub enum PayPalError {
    #[error("PayPal credentials not configured")]
    MissingCredentials,
    #[error("PayPal OAuth failed: {0}")]
    Auth(String),
    #[error("{message}")]
    Api {
        context: &'static str,
        status: StatusCode,
        message: String,
        body: String,
    },
    #[error("PayPal request timed out: {0}")]
    Timeout(&'static str),
    #[error("PayPal request failed ({context}): {source}")]
    Transport {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected PayPal response ({context}): {reason}")]
    Decode {
        context: &'static str,
        reason: String,
    },
    #[error("No approval URL returned from PayPal")]
    MissingApprovalLink,
}

#[derive(Debug, Clone)]
pub struct PayPalCredentials {
    pub client_id: String,
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct PayPalClientConfig {
    pub credentials: Option<PayPalCredentials>,
    pub base_url: String,
    pub app_url: String,
    pub brand_name: String,
    pub timeout: Duration,
}

/// Thin PayPal REST client built on reqwest. Every call is independent: tokens are passed in
/// by the caller and nothing is cached between requests.
pub struct PayPalClient {
    http: reqwest::Client,
    credentials: Option<PayPalCredentials>,
    base_url: String,
    brand_name: String,
    return_url: String,
    cancel_url: String,
}

impl PayPalClient {
    pub fn new(config: PayPalClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        let app_url = config.app_url.trim_end_matches('/');

        Ok(Self {
            http,
            credentials: config.credentials,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            brand_name: config.brand_name,
            return_url: format!("{}/payment-success", app_url),
            cancel_url: format!("{}/payment-cancelled", app_url),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        request: reqwest::RequestBuilder,
        context: &'static str,
    ) -> Result<reqwest::Response, PayPalError> {
        request.send().await.map_err(|source| {
            if source.is_timeout() {
                PayPalError::Timeout(context)
            } else {
                PayPalError::Transport { context, source }
            }
        })
    }

    async fn ensure_success(
        resp: reqwest::Response,
        context: &'static str,
    ) -> Result<reqwest::Response, PayPalError> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let debug_id = resp
            .headers()
            .get("paypal-debug-id")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = match resp.text().await {
            Ok(text) => text,
            Err(err) => format!("<failed to read response body: {err}>"),
        };
        let message = PayPalErrorEnvelope::describe(&body);

        error!(
            status = %status,
            paypal_debug_id = ?debug_id,
            response_body = %body,
            context = %context,
            "paypal api request failed"
        );

        Err(PayPalError::Api {
            context,
            status,
            message,
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(
        resp: reqwest::Response,
        context: &'static str,
    ) -> Result<T, PayPalError> {
        resp.json::<T>().await.map_err(|err| PayPalError::Decode {
            context,
            reason: err.to_string(),
        })
    }

    fn checkout_from(response: CheckoutResponse) -> Result<CreatedCheckout, PayPalError> {
        let approval_url = response
            .approval_url()
            .ok_or(PayPalError::MissingApprovalLink)?
            .to_string();

        Ok(CreatedCheckout {
            id: response.id,
            approval_url,
        })
    }

    /// Client-credentials grant. https://developer.paypal.com/api/rest/authentication/
    pub async fn access_token(&self) -> Result<String, PayPalError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(PayPalError::MissingCredentials)?;
        let basic = STANDARD.encode(format!("{}:{}", credentials.client_id, credentials.secret));

        let resp = Self::send(
            self.http
                .post(self.url("/v1/oauth2/token"))
                .header(AUTHORIZATION, format!("Basic {}", basic))
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body("grant_type=client_credentials"),
            "oauth token",
        )
        .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!(status = %status, response_body = %body, "paypal oauth token request failed");
            return Err(PayPalError::Auth(if body.is_empty() {
                status.to_string()
            } else {
                body
            }));
        }

        let token: AccessTokenResponse = Self::decode(resp, "oauth token").await?;
        debug!(expires_in = ?token.expires_in, "paypal access token acquired");
        Ok(token.access_token)
    }

    /// https://developer.paypal.com/docs/api/catalog-products/v1/#products_create
    pub async fn create_product(
        &self,
        access_token: &str,
        config: &SubscriptionPlanConfig,
    ) -> Result<String, PayPalError> {
        let body = CreateProductRequest {
            name: config.name,
            description: config.description,
            type_: "SERVICE",
            category: "SOFTWARE",
        };

        let resp = Self::send(
            self.http
                .post(self.url("/v1/catalogs/products"))
                .bearer_auth(access_token)
                .json(&body),
            "create product",
        )
        .await?;
        let resp = Self::ensure_success(resp, "create product").await?;

        let product: ResourceIdResponse = Self::decode(resp, "create product").await?;
        Ok(product.id)
    }

    /// Fixed-price plan, one regular cycle repeating until cancelled.
    /// https://developer.paypal.com/docs/api/subscriptions/v1/#plans_create
    pub async fn create_billing_plan(
        &self,
        access_token: &str,
        product_id: &str,
        config: &SubscriptionPlanConfig,
    ) -> Result<String, PayPalError> {
        let body = CreateBillingPlanRequest {
            product_id,
            name: config.billing_plan_name(),
            description: config.description,
            billing_cycles: vec![BillingCycle {
                frequency: Frequency {
                    interval_unit: config.interval.as_str(),
                    interval_count: 1,
                },
                tenure_type: "REGULAR",
                sequence: 1,
                total_cycles: 0,
                pricing_scheme: PricingScheme {
                    fixed_price: Money {
                        currency_code: config.currency.to_string(),
                        value: format_minor_amount(config.amount_minor),
                    },
                },
            }],
            payment_preferences: PaymentPreferences {
                auto_bill_outstanding: true,
                payment_failure_threshold: PAYMENT_FAILURE_THRESHOLD,
            },
        };

        let resp = Self::send(
            self.http
                .post(self.url("/v1/billing/plans"))
                .bearer_auth(access_token)
                .json(&body),
            "create billing plan",
        )
        .await?;
        let resp = Self::ensure_success(resp, "create billing plan").await?;

        let plan: ResourceIdResponse = Self::decode(resp, "create billing plan").await?;
        Ok(plan.id)
    }

    /// https://developer.paypal.com/docs/api/orders/v2/#orders_create
    pub async fn create_order(
        &self,
        access_token: &str,
        order: &OneTimeOrder,
    ) -> Result<CreatedCheckout, PayPalError> {
        let body = CreateOrderRequest {
            intent: "CAPTURE",
            purchase_units: vec![PurchaseUnit {
                description: &order.description,
                amount: Money {
                    currency_code: order.currency.clone(),
                    value: format_minor_amount(order.amount_minor),
                },
            }],
            application_context: ApplicationContext {
                brand_name: &self.brand_name,
                locale: "en-US",
                landing_page: Some("NO_PREFERENCE"),
                shipping_preference: "NO_SHIPPING",
                user_action: "PAY_NOW",
                return_url: &self.return_url,
                cancel_url: &self.cancel_url,
            },
        };

        let resp = Self::send(
            self.http
                .post(self.url("/v2/checkout/orders"))
                .bearer_auth(access_token)
                .json(&body),
            "create order",
        )
        .await?;
        let resp = Self::ensure_success(resp, "create order").await?;

        let created: CheckoutResponse = Self::decode(resp, "create order").await?;
        Self::checkout_from(created)
    }

    /// https://developer.paypal.com/docs/api/subscriptions/v1/#subscriptions_create
    pub async fn create_subscription(
        &self,
        access_token: &str,
        paypal_plan_id: &str,
    ) -> Result<CreatedCheckout, PayPalError> {
        let body = CreateSubscriptionRequest {
            plan_id: paypal_plan_id,
            application_context: ApplicationContext {
                brand_name: &self.brand_name,
                locale: "en-US",
                landing_page: None,
                shipping_preference: "NO_SHIPPING",
                user_action: "SUBSCRIBE_NOW",
                return_url: &self.return_url,
                cancel_url: &self.cancel_url,
            },
        };

        let resp = Self::send(
            self.http
                .post(self.url("/v1/billing/subscriptions"))
                .bearer_auth(access_token)
                .json(&body),
            "create subscription",
        )
        .await?;
        let resp = Self::ensure_success(resp, "create subscription").await?;

        let created: CheckoutResponse = Self::decode(resp, "create subscription").await?;
        Self::checkout_from(created)
    }

    /// Asks PayPal whether a webhook delivery is authentic. `raw_event` is the delivered body,
    /// forwarded unchanged. Returns `true` only for a `SUCCESS` verdict.
    /// https://developer.paypal.com/docs/api/webhooks/v1/#verify-webhook-signature_post
    pub async fn verify_webhook_signature(
        &self,
        access_token: &str,
        webhook_id: &str,
        headers: &TransmissionHeaders,
        raw_event: &str,
    ) -> Result<bool, PayPalError> {
        let event: &RawValue =
            serde_json::from_str(raw_event).map_err(|err| PayPalError::Decode {
                context: "verify webhook signature",
                reason: format!("webhook event is not valid json: {}", err),
            })?;

        let body = VerifyWebhookSignatureRequest {
            transmission_id: &headers.transmission_id,
            transmission_time: &headers.transmission_time,
            cert_url: &headers.cert_url,
            auth_algo: &headers.auth_algo,
            transmission_sig: &headers.transmission_sig,
            webhook_id,
            webhook_event: event,
        };

        let resp = Self::send(
            self.http
                .post(self.url("/v1/notifications/verify-webhook-signature"))
                .bearer_auth(access_token)
                .json(&body),
            "verify webhook signature",
        )
        .await?;
        let resp = Self::ensure_success(resp, "verify webhook signature").await?;

        let verdict: VerifyWebhookSignatureResponse =
            Self::decode(resp, "verify webhook signature").await?;
        Ok(verdict.verification_status == "SUCCESS")
    }
}
