//! Terminal stand-ins for the payment widget and the browser.
//!
//! Card entry needs the hosted payment SDK, so the terminal widget can mount
//! a payment intent but cannot submit or confirm one.

use gallery_checkout::api::ClientSecret;
use gallery_checkout::{Browser, ConfirmedIntent, PaymentWidget, PublishableKey, WidgetError};
use tracing::{info, warn};

const NO_CARD_ENTRY: &str = "card entry is not available in the terminal";

/// Widget that can only mount.
#[derive(Debug, Default)]
pub struct TerminalWidget;

impl PaymentWidget for TerminalWidget {
    fn configure(&mut self, publishable_key: &PublishableKey) {
        let live = !publishable_key.as_str().starts_with("pk_test_");
        info!(live, "Payment SDK configured");
    }

    async fn mount(&mut self, _client_secret: &ClientSecret) -> Result<(), WidgetError> {
        info!("Payment form mounted");
        Ok(())
    }

    async fn submit(&mut self) -> Result<(), WidgetError> {
        Err(WidgetError::Exception(NO_CARD_ENTRY.to_string()))
    }

    async fn confirm(
        &mut self,
        _client_secret: &ClientSecret,
        _return_url: &str,
    ) -> Result<ConfirmedIntent, WidgetError> {
        Err(WidgetError::Exception(NO_CARD_ENTRY.to_string()))
    }
}

/// Browser that logs instead of navigating or alerting.
#[derive(Debug, Default)]
pub struct TerminalBrowser;

impl Browser for TerminalBrowser {
    fn navigate(&mut self, location: &str) {
        info!(%location, "Would navigate");
    }

    fn alert(&mut self, message: &str) {
        warn!(%message, "Alert");
    }
}
