//! Mode detection at page load.
//!
//! A page is either a fresh checkout form or a payment-completion view for
//! an order that already has a payment intent. The completion view renders
//! a `data-payment-mode` marker and is reached with the intent's client
//! secret and the order id in the query string.

use gallery_checkout_core::OrderId;
use serde::Serialize;

use crate::api::ClientSecret;
use crate::config::{ConfigError, PublishableKey};
use crate::page::{Document, META_PUBLISHABLE_KEY, QUERY_CLIENT_SECRET, QUERY_ORDER_ID};

/// Which checkout view the page renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutMode {
    Fresh,
    Resuming,
}

impl CheckoutMode {
    /// Mode implied by the page's structural marker.
    #[must_use]
    pub const fn of(document: &Document) -> Self {
        if document.payment_mode_marker {
            Self::Resuming
        } else {
            Self::Fresh
        }
    }
}

/// Query state of a payment-completion view.
#[derive(Debug, Clone, Default)]
pub struct ResumeParams {
    pub client_secret: Option<ClientSecret>,
    /// `None` when the parameter is absent or not a valid id.
    pub order_id: Option<OrderId>,
}

impl ResumeParams {
    /// Read the resume parameters from the page URL.
    #[must_use]
    pub fn from_document(document: &Document) -> Self {
        let client_secret = document
            .query_param(QUERY_CLIENT_SECRET)
            .filter(|s| !s.trim().is_empty())
            .map(ClientSecret::new);
        let order_id = document
            .query_param(QUERY_ORDER_ID)
            .and_then(|raw| match raw.parse::<OrderId>() {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring unusable order id in URL");
                    None
                }
            });
        Self {
            client_secret,
            order_id,
        }
    }
}

/// Detected mode, with the parameters a resuming view needs.
#[derive(Debug, Clone)]
pub enum DetectedMode {
    Fresh,
    Resuming(ResumeParams),
}

impl DetectedMode {
    #[must_use]
    pub const fn kind(&self) -> CheckoutMode {
        match self {
            Self::Fresh => CheckoutMode::Fresh,
            Self::Resuming(_) => CheckoutMode::Resuming,
        }
    }
}

/// Everything decided once at page load.
#[derive(Debug, Clone)]
pub struct Detection {
    pub publishable_key: PublishableKey,
    pub mode: DetectedMode,
}

/// Inspect the page once and decide how to wire it.
///
/// Reads only; the document is not modified.
///
/// # Errors
///
/// Returns a [`ConfigError`] when the publishable key meta tag is absent,
/// blank or unsafe. The session cannot proceed without it.
pub fn detect(document: &Document) -> Result<Detection, ConfigError> {
    let publishable_key = PublishableKey::parse(document.meta(META_PUBLISHABLE_KEY))?;

    let mode = match CheckoutMode::of(document) {
        CheckoutMode::Fresh => DetectedMode::Fresh,
        CheckoutMode::Resuming => DetectedMode::Resuming(ResumeParams::from_document(document)),
    };

    Ok(Detection {
        publishable_key,
        mode,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn page(location: &str, marker: bool) -> Document {
        let mut doc = Document {
            location: location.to_string(),
            payment_mode_marker: marker,
            ..Document::default()
        };
        doc.meta
            .insert(META_PUBLISHABLE_KEY.to_string(), "pk_test_51Habc".to_string());
        doc
    }

    #[test]
    fn test_detect_fresh() {
        let detection = detect(&page("https://shop.test/orders/checkout/", false)).unwrap();
        assert_eq!(detection.mode.kind(), CheckoutMode::Fresh);
        assert_eq!(detection.publishable_key.as_str(), "pk_test_51Habc");
    }

    #[test]
    fn test_detect_resuming_reads_query() {
        let detection = detect(&page(
            "https://shop.test/orders/pay/?payment_intent_client_secret=cs_test_1&order_id=42",
            true,
        ))
        .unwrap();
        let DetectedMode::Resuming(params) = detection.mode else {
            panic!("expected resuming mode");
        };
        assert_eq!(params.client_secret.unwrap().expose(), "cs_test_1");
        assert_eq!(params.order_id, Some(OrderId::new(42)));
    }

    #[test]
    fn test_query_without_marker_is_fresh() {
        let detection = detect(&page(
            "https://shop.test/orders/checkout/?payment_intent_client_secret=cs_test_1",
            false,
        ))
        .unwrap();
        assert_eq!(detection.mode.kind(), CheckoutMode::Fresh);
    }

    #[test]
    fn test_resuming_without_secret_or_bad_order_id() {
        let detection =
            detect(&page("https://shop.test/orders/pay/?order_id=null", true)).unwrap();
        let DetectedMode::Resuming(params) = detection.mode else {
            panic!("expected resuming mode");
        };
        assert!(params.client_secret.is_none());
        assert!(params.order_id.is_none());
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let mut doc = page("https://shop.test/orders/checkout/", false);
        doc.meta.clear();
        assert!(matches!(
            detect(&doc),
            Err(ConfigError::MissingPublishableKey)
        ));
    }
}
