//! Checkout state machines.
//!
//! Business state lives in explicit enums ([`CheckoutState`] for a fresh
//! checkout, [`ResumingState`] for a payment-completion view). Each legal
//! transition is a method; anything else is a [`TransitionError`]. The
//! enabled/label state of the page controls is rendered *from* these enums
//! via [`ControlView`] and never read back.

mod fresh;
mod resuming;

use std::future::Future;
use std::time::Duration;

use gallery_checkout_core::{OrderId, PaymentId};
use thiserror::Error;

use crate::api::{ClientSecret, OrderApi};
use crate::browser::Browser;
use crate::config::CheckoutConfig;
use crate::error::CheckoutError;
use crate::page::{Control, Document};
use crate::widget::{ConfirmedIntent, PaymentWidget, WidgetError};

pub use fresh::{CheckoutState, FreshCheckout};
pub use resuming::{ResumeHandle, ResumingPayment, ResumingState};

/// Control labels.
pub mod labels {
    pub const PLACE_ORDER: &str = "Place Order";
    pub const PROCESSING: &str = "Processing...";
    pub const COMPLETE_PAYMENT: &str = "Complete Payment";
    pub const REDIRECTING: &str = "Redirecting...";
}

/// Message shown when the payment SDK fails outright.
const PAYMENT_EXCEPTION_MESSAGE: &str = "An error occurred during payment. Please try again.";

/// An event that is not legal in the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} while {state}")]
pub struct TransitionError {
    pub state: &'static str,
    pub action: &'static str,
}

/// How an action control should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlView {
    pub label: &'static str,
    pub enabled: bool,
}

impl ControlView {
    pub(crate) const fn enabled(label: &'static str) -> Self {
        Self {
            label,
            enabled: true,
        }
    }

    pub(crate) const fn busy(label: &'static str) -> Self {
        Self {
            label,
            enabled: false,
        }
    }

    /// Write this view onto a rendered control. Missing controls are
    /// skipped.
    pub fn apply(self, control: Option<&mut Control>) {
        if let Some(control) = control {
            self.label.clone_into(&mut control.label);
            control.disabled = !self.enabled;
        }
    }
}

/// A payment intent started for an order created on this page.
#[derive(Debug, Clone)]
pub struct PaymentIntentHandle {
    pub order_id: OrderId,
    pub client_secret: ClientSecret,
    pub payment_id: Option<PaymentId>,
}

/// Everything a transition handler may touch, borrowed from the controller
/// for the duration of one event.
pub struct FlowContext<'a, A, W, B> {
    pub config: &'a CheckoutConfig,
    pub document: &'a mut Document,
    pub api: &'a A,
    pub widget: &'a mut W,
    pub browser: &'a mut B,
}

impl<A: OrderApi, W: PaymentWidget, B: Browser> FlowContext<'_, A, W, B> {
    /// Where to send the buyer after a successful payment.
    fn success_path(&self, order_id: Option<OrderId>) -> String {
        order_id.map_or_else(
            || self.config.fallback_path.clone(),
            |id| self.config.success_path_for(id),
        )
    }

    /// Absolute form of `path` for the SDK's return URL.
    fn absolute(&self, path: &str) -> String {
        self.document
            .resolve(path)
            .map_or_else(|| path.to_string(), String::from)
    }
}

/// Run `future` with the configured timeout.
pub(crate) async fn bounded<T, E, F>(
    operation: &'static str,
    after: Duration,
    future: F,
) -> Result<T, CheckoutError>
where
    F: Future<Output = Result<T, E>>,
    CheckoutError: From<E>,
{
    match tokio::time::timeout(after, future).await {
        Ok(result) => result.map_err(CheckoutError::from),
        Err(_) => {
            tracing::warn!(operation, timeout_secs = after.as_secs(), "Call timed out");
            Err(CheckoutError::Timeout { operation, after })
        }
    }
}

/// Confirm the intent through the widget and require that it succeeded.
///
/// With `submit_first`, pending widget input is validated and collected
/// before confirming, as a fresh checkout must.
///
/// Neither step is bounded by the configured timeout. Confirmation may wait
/// on the buyer (a 3-D Secure challenge), and dropping the future would not
/// stop the SDK, so the control stays disabled until the SDK settles.
pub(crate) async fn confirm_payment<W: PaymentWidget>(
    widget: &mut W,
    client_secret: &ClientSecret,
    return_url: &str,
    submit_first: bool,
) -> Result<ConfirmedIntent, CheckoutError> {
    if submit_first {
        widget.submit().await?;
    }
    let intent = widget.confirm(client_secret, return_url).await?;
    if intent.status.is_succeeded() {
        Ok(intent)
    } else {
        Err(CheckoutError::PaymentIncomplete(intent.status))
    }
}

/// Buyer-facing message for a failed payment confirmation.
fn payment_failure_message(error: &CheckoutError) -> String {
    match error {
        CheckoutError::Widget(WidgetError::Rejected { message }) => {
            format!("Payment failed: {message}")
        }
        CheckoutError::PaymentIncomplete(status) => {
            format!("Payment was not completed (status: {status}). Please try again.")
        }
        _ => PAYMENT_EXCEPTION_MESSAGE.to_string(),
    }
}
