//! Run a fresh checkout against the configured backend.
//!
//! # Environment Variables
//!
//! - `CHECKOUT_API_BASE_URL` - Shop backend base URL (required)
//! - `CHECKOUT_TIMEOUT_SECS` - Per-call timeout (default 30)

use std::path::Path;

use gallery_checkout::flow::CheckoutState;
use gallery_checkout::{
    CheckoutConfig, CheckoutError, CheckoutFlowController, CheckoutMode, Document, HttpOrderApi,
    OrderApi, PageEvent,
};
use gallery_checkout_core::{OrderId, PaymentId};
use thiserror::Error;

use crate::terminal::{TerminalBrowser, TerminalWidget};

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    /// The page completes an existing payment instead of placing an order.
    #[error("page is a payment-completion view, not a checkout form")]
    NotFresh,

    /// Submission returned without a payment form mounted.
    #[error("checkout did not reach the payment step")]
    NoPayment,

    #[error(transparent)]
    Checkout(#[from] CheckoutError),
}

/// The order placed and the payment intent started for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub payment_id: Option<PaymentId>,
}

/// Submit the checkout form on `document` once.
///
/// # Errors
///
/// Returns [`PlaceOrderError`] when the page is not a checkout form or the
/// order could not be placed.
pub async fn place_order<A: OrderApi>(
    config: CheckoutConfig,
    document: Document,
    api: A,
) -> Result<PlacedOrder, PlaceOrderError> {
    let mut controller = CheckoutFlowController::initialize(
        config,
        document,
        api,
        TerminalWidget,
        TerminalBrowser,
    )
    .await?;
    if controller.mode() != CheckoutMode::Fresh {
        return Err(PlaceOrderError::NotFresh);
    }

    controller.dispatch(PageEvent::SubmitOrder).await?;

    controller
        .fresh_state()
        .and_then(CheckoutState::payment)
        .map(|handle| PlacedOrder {
            order_id: handle.order_id,
            payment_id: handle.payment_id,
        })
        .ok_or(PlaceOrderError::NoPayment)
}

/// Place the order described by the page at `path`.
///
/// # Errors
///
/// Returns an error if configuration is missing, the page cannot be loaded,
/// or the backend rejects the order.
pub async fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let document = super::load_page(path)?;
    let config = CheckoutConfig::from_env()?;
    let api = HttpOrderApi::new(config.api.clone())?;

    let placed = place_order(config, document, api).await?;
    tracing::info!(
        order_id = %placed.order_id,
        payment_id = ?placed.payment_id,
        "Order placed, payment intent started"
    );
    Ok(())
}
