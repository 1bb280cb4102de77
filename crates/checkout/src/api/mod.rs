//! Order and payment API port.
//!
//! # Endpoints
//!
//! - `POST /orders/create/` - create an order from the collected checkout data
//! - `POST /orders/start-payment/{order_id}/` - start a payment intent, returns
//!   its client secret
//!
//! Both requests carry the page's anti-forgery token in `X-CSRFToken`.
//! Start-payment requests also carry an `Idempotency-Key` so the backend
//! can hand back the same payment record for a repeated call.
//!
//! The controller only depends on the [`OrderApi`] trait; [`HttpOrderApi`]
//! is the `reqwest` implementation.

mod client;

use std::fmt;

use gallery_checkout_core::{OrderId, OrderRequest, OrderResult, PaymentId};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::ORDER_ID_PLACEHOLDER;

pub use client::HttpOrderApi;

/// Header carrying the anti-forgery token.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Header carrying the start-payment idempotency key.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

const CREATE_ORDER_PATH: &str = "/orders/create/";
const START_PAYMENT_PATH: &str = "/orders/start-payment/{order_id}/";

/// Longest error body excerpt kept for diagnostics.
const MAX_ERROR_EXCERPT: usize = 200;

/// Errors that can occur when talking to the order API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Endpoint URL could not be built.
    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),

    /// A token could not be encoded as a header value.
    #[error("Invalid value for header {0}")]
    Header(&'static str),
}

impl ApiError {
    /// Short description suitable for showing to the buyer.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } if !message.is_empty() => message.clone(),
            Self::Api { status, .. } => format!("the server responded with status {status}"),
            Self::Http(_) => "the server could not be reached".to_string(),
            Self::Parse(_) | Self::Url(_) | Self::Header(_) => {
                "the server sent an unexpected response".to_string()
            }
        }
    }
}

/// Payment intent client secret.
///
/// Scopes the page's authority to confirm one payment intent. Never logged.
#[derive(Clone)]
pub struct ClientSecret(SecretString);

impl ClientSecret {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(SecretString::from(secret.into()))
    }

    /// The raw secret, for handing to the payment SDK.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientSecret([REDACTED])")
    }
}

/// Anti-forgery token read from the checkout form.
#[derive(Clone)]
pub struct CsrfToken(SecretString);

impl CsrfToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CsrfToken([REDACTED])")
    }
}

/// A payment intent started for an order.
#[derive(Debug, Clone)]
pub struct StartedPayment {
    pub client_secret: ClientSecret,
    pub payment_id: Option<PaymentId>,
}

/// Wire shape of the start-payment response.
#[derive(Deserialize)]
struct StartPaymentBody {
    client_secret: Option<String>,
    #[serde(default)]
    payment_id: Option<PaymentId>,
}

impl TryFrom<StartPaymentBody> for StartedPayment {
    type Error = ApiError;

    fn try_from(body: StartPaymentBody) -> Result<Self, Self::Error> {
        let secret = body
            .client_secret
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ApiError::Parse("response has no client_secret".to_string()))?;
        Ok(Self {
            client_secret: ClientSecret::new(secret),
            payment_id: body.payment_id,
        })
    }
}

/// Order API endpoint configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend origin, e.g. `https://shop.example`
    pub base_url: Url,
    /// Order creation path
    pub create_order_path: String,
    /// Start-payment path template containing `{order_id}`
    pub start_payment_path: String,
}

impl ApiConfig {
    /// Default endpoint paths on `base_url`.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            create_order_path: CREATE_ORDER_PATH.to_string(),
            start_payment_path: START_PAYMENT_PATH.to_string(),
        }
    }

    /// Absolute order creation URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured path cannot be joined to the base.
    pub fn create_order_url(&self) -> Result<Url, url::ParseError> {
        self.base_url.join(&self.create_order_path)
    }

    /// Absolute start-payment URL for `order_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured path cannot be joined to the base.
    pub fn start_payment_url(&self, order_id: OrderId) -> Result<Url, url::ParseError> {
        let path = self
            .start_payment_path
            .replace(ORDER_ID_PLACEHOLDER, &order_id.to_string());
        self.base_url.join(&path)
    }
}

/// The shop backend's order and payment endpoints.
#[allow(async_fn_in_trait)]
pub trait OrderApi {
    /// Create an order. Payment is not captured yet.
    async fn create_order(
        &self,
        order: &OrderRequest,
        csrf: Option<&CsrfToken>,
    ) -> Result<OrderResult, ApiError>;

    /// Start a payment intent for `order_id`.
    async fn start_payment(
        &self,
        order_id: OrderId,
        csrf: Option<&CsrfToken>,
        idempotency_key: &str,
    ) -> Result<StartedPayment, ApiError>;
}

/// Pull a readable message out of an error response body.
///
/// Prefers a `{"detail": ...}` body, then field errors, then a truncated
/// excerpt of the raw text.
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => {
            if let Some(detail) = map.get("detail").and_then(serde_json::Value::as_str) {
                return detail.to_string();
            }
            map.iter()
                .map(|(field, errors)| format!("{field}: {}", flatten_errors(errors)))
                .collect::<Vec<_>>()
                .join("; ")
        }
        _ => body.trim().chars().take(MAX_ERROR_EXCERPT).collect(),
    }
}

fn flatten_errors(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(flatten_errors)
            .collect::<Vec<_>>()
            .join(", "),
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(key, v)| format!("{key}: {}", flatten_errors(v)))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        let config = ApiConfig::new(Url::parse("https://shop.test").unwrap());
        assert_eq!(
            config.create_order_url().unwrap().as_str(),
            "https://shop.test/orders/create/"
        );
        assert_eq!(
            config.start_payment_url(OrderId::new(42)).unwrap().as_str(),
            "https://shop.test/orders/start-payment/42/"
        );
    }

    #[test]
    fn test_error_message_prefers_detail() {
        assert_eq!(error_message(r#"{"detail": "Order not found"}"#), "Order not found");
    }

    #[test]
    fn test_error_message_flattens_field_errors() {
        let message =
            error_message(r#"{"guest_email": ["Guest checkout requires guest_email"]}"#);
        assert_eq!(message, "guest_email: Guest checkout requires guest_email");

        let message = error_message(r#"{"items": [{"0": "Quantity must be > 0"}]}"#);
        assert_eq!(message, "items: 0: Quantity must be > 0");
    }

    #[test]
    fn test_error_message_truncates_plain_text() {
        let body = "x".repeat(500);
        assert_eq!(error_message(&body).len(), MAX_ERROR_EXCERPT);
    }

    #[test]
    fn test_user_message() {
        let err = ApiError::Api {
            status: 400,
            message: "Order must contain at least one item".into(),
        };
        assert_eq!(err.user_message(), "Order must contain at least one item");

        let err = ApiError::Api {
            status: 502,
            message: String::new(),
        };
        assert_eq!(err.user_message(), "the server responded with status 502");
    }

    #[test]
    fn test_start_payment_body_requires_secret() {
        let body: StartPaymentBody =
            serde_json::from_str(r#"{"payment_id": 3, "client_secret": "cs_test_1"}"#).unwrap();
        let started = StartedPayment::try_from(body).unwrap();
        assert_eq!(started.client_secret.expose(), "cs_test_1");
        assert_eq!(started.payment_id, Some(PaymentId::new(3)));

        let body: StartPaymentBody = serde_json::from_str(r#"{"payment_id": 3}"#).unwrap();
        assert!(matches!(
            StartedPayment::try_from(body),
            Err(ApiError::Parse(_))
        ));
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let secret = ClientSecret::new("cs_live_very_secret");
        assert!(!format!("{secret:?}").contains("very_secret"));
        let token = CsrfToken::new("csrf-value");
        assert!(!format!("{token:?}").contains("csrf-value"));
    }
}
