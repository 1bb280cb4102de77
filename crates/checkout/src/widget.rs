//! Hosted payment widget port.
//!
//! The payment SDK renders card entry, tokenizes card details and handles
//! 3-D Secure on its own. The controller only sequences the calls:
//! `configure` once at load, `mount` once per payment intent, then
//! `submit` + `confirm` for a fresh checkout or `confirm` alone when
//! resuming an in-progress payment.

use gallery_checkout_core::PaymentIntentStatus;
use thiserror::Error;

use crate::api::ClientSecret;
use crate::config::PublishableKey;

/// Errors reported by the payment widget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WidgetError {
    /// The SDK returned an error result (declined card, invalid details,
    /// incomplete fields). The message is meant for the buyer.
    #[error("{message}")]
    Rejected { message: String },

    /// The SDK call itself failed (script error, network failure).
    #[error("payment SDK failure: {0}")]
    Exception(String),
}

/// Result of a confirmation that the SDK did not reject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedIntent {
    /// Provider-side payment intent id, when reported.
    pub id: Option<String>,
    pub status: PaymentIntentStatus,
}

/// The payment SDK's widget, as seen by the checkout controller.
#[allow(async_fn_in_trait)]
pub trait PaymentWidget {
    /// Initialize the SDK with the page's publishable key.
    fn configure(&mut self, publishable_key: &PublishableKey);

    /// Render the payment entry surface bound to `client_secret`.
    async fn mount(&mut self, client_secret: &ClientSecret) -> Result<(), WidgetError>;

    /// Validate and collect the pending widget input.
    async fn submit(&mut self) -> Result<(), WidgetError>;

    /// Confirm the payment intent. `return_url` is where the SDK sends the
    /// buyer after an off-page authentication step.
    async fn confirm(
        &mut self,
        client_secret: &ClientSecret,
        return_url: &str,
    ) -> Result<ConfirmedIntent, WidgetError>;
}
