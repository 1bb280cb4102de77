//! Offline inspection of a page snapshot.

use std::path::Path;

use gallery_checkout::mode::DetectedMode;
use gallery_checkout::session::CheckoutSession;
use gallery_checkout::{CheckoutMode, ConfigError, Document, detect};
use gallery_checkout_core::{OrderId, OrderRequest};
use serde::Serialize;

/// What the controller would do with a page.
#[derive(Debug, Serialize)]
pub struct Inspection {
    pub mode: CheckoutMode,
    pub test_key: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<ResumeSummary>,
    /// Payload a submission would send, in fresh mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderRequest>,
    /// Why a submission would be blocked, in fresh mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResumeSummary {
    pub has_client_secret: bool,
    pub order_id: Option<OrderId>,
}

/// Inspect `document` without touching the network.
///
/// # Errors
///
/// Returns [`ConfigError`] when the page would fail to initialize.
pub fn inspect(document: &Document) -> Result<Inspection, ConfigError> {
    let detection = detect(document)?;
    let mut inspection = Inspection {
        mode: detection.mode.kind(),
        test_key: detection.publishable_key.as_str().starts_with("pk_test_"),
        resume: None,
        order: None,
        blocked: None,
    };

    match detection.mode {
        DetectedMode::Fresh => match CheckoutSession::collect(document) {
            Ok(session) => inspection.order = Some(session.order_request()),
            Err(e) => inspection.blocked = Some(e.to_string()),
        },
        DetectedMode::Resuming(params) => {
            inspection.resume = Some(ResumeSummary {
                has_client_secret: params.client_secret.is_some(),
                order_id: params.order_id,
            });
        }
    }
    Ok(inspection)
}

/// Print the inspection of the page at `path` as JSON.
///
/// # Errors
///
/// Returns an error if the page cannot be loaded or would not initialize.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let document = super::load_page(path)?;
    let inspection = inspect(&document)?;
    tracing::info!(mode = ?inspection.mode, "Inspected page");

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
    }
    Ok(())
}
