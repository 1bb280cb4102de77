//! Unified error handling for the checkout controller.
//!
//! Every failure of a checkout step is a [`CheckoutError`]. Recoverable
//! errors are shown to the buyer and the triggering control is restored
//! before the error is returned, so callers only need to log them.
//! Configuration errors abort initialization.

use std::time::Duration;

use gallery_checkout_core::PaymentIntentStatus;
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::flow::TransitionError;
use crate::session::SessionError;
use crate::widget::WidgetError;

/// Checkout-level error type.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Page or environment configuration is unusable (fatal).
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Order API call failed.
    #[error("Order API error: {0}")]
    Api(#[from] ApiError),

    /// Payment widget reported an error.
    #[error("Payment widget error: {0}")]
    Widget(#[from] WidgetError),

    /// Checkout form data is unusable.
    #[error("Invalid checkout data: {0}")]
    Session(#[from] SessionError),

    /// The payment SDK finished without an error but the intent did not
    /// succeed.
    #[error("Payment not completed (status: {0})")]
    PaymentIncomplete(PaymentIntentStatus),

    /// An API call or the widget mount did not settle in time.
    #[error("Timed out after {}s while {operation}", .after.as_secs())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The event is not legal in the current checkout state.
    #[error("Illegal transition: {0}")]
    Transition(#[from] TransitionError),
}

impl CheckoutError {
    /// Whether the buyer can retry from the same page.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

/// Result type alias for `CheckoutError`.
pub type Result<T> = std::result::Result<T, CheckoutError>;
