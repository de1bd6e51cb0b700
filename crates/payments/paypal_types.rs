//! Request and response bodies for the PayPal REST endpoints this service calls, plus the
//! inbound webhook event shape. Required fields are plain, optional ones are `Option`, so an
//! unexpected response fails to decode instead of surfacing as a missing value later on.

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

#[derive(Debug, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub expires_in: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CreateProductRequest<'a> {
    pub name: &'a str,
    pub description: &'a str,
    #[serde(rename = "type")]
    pub type_: &'static str,
    pub category: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ResourceIdResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct CreateBillingPlanRequest<'a> {
    pub product_id: &'a str,
    pub name: String,
    pub description: &'a str,
    pub billing_cycles: Vec<BillingCycle>,
    pub payment_preferences: PaymentPreferences,
}

#[derive(Debug, Serialize)]
pub struct BillingCycle {
    pub frequency: Frequency,
    pub tenure_type: &'static str,
    pub sequence: u32,
    /// `0` means the cycle repeats until cancelled.
    pub total_cycles: u32,
    pub pricing_scheme: PricingScheme,
}

#[derive(Debug, Serialize)]
pub struct Frequency {
    pub interval_unit: &'static str,
    pub interval_count: u32,
}

#[derive(Debug, Serialize)]
pub struct PricingScheme {
    pub fixed_price: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Money {
    pub currency_code: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentPreferences {
    pub auto_bill_outstanding: bool,
    pub payment_failure_threshold: u32,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderRequest<'a> {
    pub intent: &'static str,
    pub purchase_units: Vec<PurchaseUnit<'a>>,
    pub application_context: ApplicationContext<'a>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseUnit<'a> {
    pub description: &'a str,
    pub amount: Money,
}

#[derive(Debug, Serialize)]
pub struct CreateSubscriptionRequest<'a> {
    pub plan_id: &'a str,
    pub application_context: ApplicationContext<'a>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationContext<'a> {
    pub brand_name: &'a str,
    pub locale: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landing_page: Option<&'static str>,
    pub shipping_preference: &'static str,
    pub user_action: &'static str,
    pub return_url: &'a str,
    pub cancel_url: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutResponse {
    pub id: String,
    pub status: Option<String>,
    #[serde(default)]
    pub links: Vec<LinkDescription>,
}

#[derive(Debug, Deserialize)]
pub struct LinkDescription {
    pub href: String,
    pub rel: String,
    pub method: Option<String>,
}

impl CheckoutResponse {
    pub fn approval_url(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.rel == "approve")
            .map(|link| link.href.as_str())
    }
}

/// Result of creating either a checkout order or a subscription: both hand the user an
/// approval page to finish on PayPal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCheckout {
    pub id: String,
    pub approval_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneTimeOrder {
    pub amount_minor: i64,
    pub currency: String,
    pub description: String,
}

pub const HEADER_TRANSMISSION_ID: &str = "paypal-transmission-id";
pub const HEADER_TRANSMISSION_TIME: &str = "paypal-transmission-time";
pub const HEADER_CERT_URL: &str = "paypal-cert-url";
pub const HEADER_AUTH_ALGO: &str = "paypal-auth-algo";
pub const HEADER_TRANSMISSION_SIG: &str = "paypal-transmission-sig";

/// The five signature headers PayPal attaches to every webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmissionHeaders {
    pub transmission_id: String,
    pub transmission_time: String,
    pub cert_url: String,
    pub auth_algo: String,
    pub transmission_sig: String,
}

impl TransmissionHeaders {
    /// Returns `None` when any of the five headers is missing or not valid UTF-8.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        Some(Self {
            transmission_id: get(HEADER_TRANSMISSION_ID)?,
            transmission_time: get(HEADER_TRANSMISSION_TIME)?,
            cert_url: get(HEADER_CERT_URL)?,
            auth_algo: get(HEADER_AUTH_ALGO)?,
            transmission_sig: get(HEADER_TRANSMISSION_SIG)?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyWebhookSignatureRequest<'a> {
    pub transmission_id: &'a str,
    pub transmission_time: &'a str,
    pub cert_url: &'a str,
    pub auth_algo: &'a str,
    pub transmission_sig: &'a str,
    pub webhook_id: &'a str,
    /// Spliced in byte for byte: PayPal checks the signature against the event as delivered.
    pub webhook_event: &'a RawValue,
}

#[derive(Debug, Deserialize)]
pub struct VerifyWebhookSignatureResponse {
    pub verification_status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PayPalErrorEnvelope {
    pub name: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub details: Vec<PayPalErrorDetail>,
    /// OAuth failures use `error` / `error_description` instead of `message`.
    pub error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PayPalErrorDetail {
    pub issue: Option<String>,
    pub description: Option<String>,
}

impl PayPalErrorEnvelope {
    /// Human-readable summary of a failed PayPal response body. Never fails: bodies that are not
    /// a PayPal error envelope are quoted verbatim.
    pub fn describe(body: &str) -> String {
        let body = if body.trim().is_empty() {
            "<empty response body>"
        } else {
            body
        };

        let Ok(envelope) = serde_json::from_str::<PayPalErrorEnvelope>(body) else {
            return format!("PayPal Error: {}", body);
        };

        let message = envelope.message.or(envelope.error_description);

        if let Some(detail) = envelope.details.first() {
            let issue = detail
                .issue
                .clone()
                .or(message)
                .or(envelope.name)
                .unwrap_or_else(|| "UNKNOWN_ERROR".to_string());
            return match detail.description.as_deref() {
                Some(description) if !description.is_empty() => {
                    format!("PayPal Error: {}. {}", issue, description)
                }
                _ => format!("PayPal Error: {}.", issue),
            };
        }

        match message {
            Some(message) => format!("PayPal Error: {}", message),
            None => format!("PayPal Error: {}", body),
        }
    }
}

pub const EVENT_SUBSCRIPTION_ACTIVATED: &str = "BILLING.SUBSCRIPTION.ACTIVATED";
pub const EVENT_SUBSCRIPTION_CANCELLED: &str = "BILLING.SUBSCRIPTION.CANCELLED";
pub const EVENT_SUBSCRIPTION_EXPIRED: &str = "BILLING.SUBSCRIPTION.EXPIRED";
pub const EVENT_PAYMENT_CAPTURE_COMPLETED: &str = "PAYMENT.CAPTURE.COMPLETED";

#[derive(Debug, Clone, Deserialize)]
pub struct PayPalWebhookEvent {
    pub id: Option<String>,
    pub event_type: String,
    pub resource_type: Option<String>,
    pub summary: Option<String>,
    /// Kept undecoded so events this service ignores never fail on their resource shape.
    #[serde(default)]
    pub resource: serde_json::Value,
}

impl PayPalWebhookEvent {
    pub fn resource_id(&self) -> Option<&str> {
        self.resource.get("id").and_then(serde_json::Value::as_str)
    }

    /// Decodes the resource of a subscription or capture event. A missing resource decodes as
    /// an empty one.
    pub fn decode_resource(&self) -> serde_json::Result<WebhookResource> {
        if self.resource.is_null() {
            return Ok(WebhookResource::default());
        }
        WebhookResource::deserialize(&self.resource)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookResource {
    pub id: Option<String>,
    pub status: Option<String>,
    /// Present on captures that belong to a subscription renewal.
    pub billing_agreement_id: Option<String>,
    pub billing_info: Option<BillingInfo>,
    pub supplementary_data: Option<SupplementaryData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingInfo {
    pub next_billing_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SupplementaryData {
    pub related_ids: Option<RelatedIds>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelatedIds {
    pub order_id: Option<String>,
}

impl WebhookResource {
    /// The checkout order a capture belongs to. Capture events carry the capture id as
    /// `resource.id`; the order id lives under `supplementary_data.related_ids`.
    pub fn related_order_id(&self) -> Option<&str> {
        self.supplementary_data
            .as_ref()
            .and_then(|data| data.related_ids.as_ref())
            .and_then(|ids| ids.order_id.as_deref())
            .or(self.id.as_deref())
    }

    pub fn next_billing_time(&self) -> Option<DateTime<Utc>> {
        self.billing_info.as_ref().and_then(|info| info.next_billing_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn describes_first_error_detail() {
        let body = r#"{
            "name": "UNPROCESSABLE_ENTITY",
            "message": "The requested action could not be performed.",
            "details": [{"issue": "SUBSCRIPTION_STATUS_INVALID", "description": "Invalid subscription status for cancel action."}]
        }"#;
        assert_eq!(
            PayPalErrorEnvelope::describe(body),
            "PayPal Error: SUBSCRIPTION_STATUS_INVALID. Invalid subscription status for cancel action."
        );
    }

    #[test]
    fn falls_back_to_message_then_raw_text() {
        assert_eq!(
            PayPalErrorEnvelope::describe(r#"{"name":"INTERNAL_SERVER_ERROR","message":"An internal server error occurred."}"#),
            "PayPal Error: An internal server error occurred."
        );
        assert_eq!(
            PayPalErrorEnvelope::describe("<html>Bad Gateway</html>"),
            "PayPal Error: <html>Bad Gateway</html>"
        );
        assert_eq!(
            PayPalErrorEnvelope::describe(""),
            "PayPal Error: <empty response body>"
        );
    }

    #[test]
    fn describes_oauth_errors() {
        let body = r#"{"error":"invalid_client","error_description":"Client Authentication failed"}"#;
        assert_eq!(
            PayPalErrorEnvelope::describe(body),
            "PayPal Error: Client Authentication failed"
        );
    }

    #[test]
    fn finds_approval_link() {
        let response: CheckoutResponse = serde_json::from_str(
            r#"{
                "id": "5O190127TN364715T",
                "status": "CREATED",
                "links": [
                    {"href": "https://api-m.paypal.com/v2/checkout/orders/5O190127TN364715T", "rel": "self", "method": "GET"},
                    {"href": "https://www.paypal.com/checkoutnow?token=5O190127TN364715T", "rel": "approve", "method": "GET"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(
            response.approval_url(),
            Some("https://www.paypal.com/checkoutnow?token=5O190127TN364715T")
        );
    }

    #[test]
    fn missing_links_have_no_approval_url() {
        let response: CheckoutResponse =
            serde_json::from_str(r#"{"id": "I-BW452GLLEP1G", "status": "APPROVAL_PENDING"}"#).unwrap();
        assert_eq!(response.approval_url(), None);
    }

    #[test]
    fn transmission_headers_require_all_five() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_TRANSMISSION_ID, HeaderValue::from_static("69cd13f0-d67a-11e5-baa3-778b53f4ae55"));
        headers.insert(HEADER_TRANSMISSION_TIME, HeaderValue::from_static("2016-02-18T20:01:35Z"));
        headers.insert(HEADER_CERT_URL, HeaderValue::from_static("https://api.sandbox.paypal.com/v1/notifications/certs/CERT-360caa42"));
        headers.insert(HEADER_AUTH_ALGO, HeaderValue::from_static("SHA256withRSA"));
        assert!(TransmissionHeaders::from_headers(&headers).is_none());

        headers.insert(HEADER_TRANSMISSION_SIG, HeaderValue::from_static("lmI95Jx3Y9nhR5SJWlHVIWpg4AgFk7n9bCHSRxbrd8A9zrhdu2rMyFrmz+Zjh3s3boXB07VXCXUZy/UFzUlnGJn0wDugt7FlSvdKeIJenLRemUxYCPVoEZzg9VFNqOa48gMkvF+XTpxBeUx/kWy6B5cp7GkT2+pOowfRK7OaynuxUoKW3JcMWw272VKjLTtTAShncla7tGF+55rxyt2KNZIIqxNMJ48RDZheGU5w1npu9dZHnPgTXB9iomeVRoD8O/jhRpnKsGrDschyNdkeh81BJJMH4Ctc6lnCCquoP/GzCzz33MMsNdid7vL/NIWaCsekQpW26FpWPi/tfj8nLA=="));
        let parsed = TransmissionHeaders::from_headers(&headers).unwrap();
        assert_eq!(parsed.auth_algo, "SHA256withRSA");
        assert_eq!(parsed.transmission_id, "69cd13f0-d67a-11e5-baa3-778b53f4ae55");
    }

    #[test]
    fn capture_prefers_related_order_id() {
        let event: PayPalWebhookEvent = serde_json::from_str(
            r#"{
                "id": "WH-58D329510W468432D-8HN650336L201105X",
                "event_type": "PAYMENT.CAPTURE.COMPLETED",
                "resource": {
                    "id": "42311647XV020574X",
                    "status": "COMPLETED",
                    "supplementary_data": {"related_ids": {"order_id": "5O190127TN364715T"}}
                }
            }"#,
        )
        .unwrap();
        let resource = event.decode_resource().unwrap();
        assert_eq!(resource.related_order_id(), Some("5O190127TN364715T"));
        assert_eq!(resource.billing_agreement_id, None);
    }

    #[test]
    fn activation_carries_next_billing_time() {
        let event: PayPalWebhookEvent = serde_json::from_str(
            r#"{
                "event_type": "BILLING.SUBSCRIPTION.ACTIVATED",
                "resource": {
                    "id": "I-BW452GLLEP1G",
                    "status": "ACTIVE",
                    "billing_info": {"next_billing_time": "2026-11-19T10:00:00Z"}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(
            event
                .decode_resource()
                .unwrap()
                .next_billing_time()
                .map(|t| t.to_rfc3339()),
            Some("2026-11-19T10:00:00+00:00".to_string())
        );
    }

    #[test]
    fn unfamiliar_resource_shape_still_parses_envelope() {
        let event: PayPalWebhookEvent = serde_json::from_str(
            r#"{
                "event_type": "CUSTOMER.DISPUTE.CREATED",
                "resource": {"id": 42, "billing_info": "not an object"}
            }"#,
        )
        .unwrap();
        assert_eq!(event.event_type, "CUSTOMER.DISPUTE.CREATED");
        assert_eq!(event.resource_id(), None);
        assert!(event.decode_resource().is_err());
    }

    #[test]
    fn missing_resource_decodes_empty() {
        let event: PayPalWebhookEvent =
            serde_json::from_str(r#"{"event_type": "BILLING.SUBSCRIPTION.CANCELLED"}"#).unwrap();
        assert_eq!(event.decode_resource().unwrap().id, None);
    }
}
