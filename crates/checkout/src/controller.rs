//! The page-level checkout controller.
//!
//! One controller is built per page load. It detects the mode, wires the
//! matching handler and then receives every page event through
//! [`CheckoutFlowController::dispatch`]. Dispatch takes `&mut self`, so a
//! second event cannot start while a request from the first is in flight.

use tracing::{error, info};

use crate::api::OrderApi;
use crate::billing;
use crate::browser::Browser;
use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, Result};
use crate::flow::{
    CheckoutState, FlowContext, FreshCheckout, ResumingPayment, ResumingState, TransitionError,
};
use crate::mode::{self, CheckoutMode, DetectedMode};
use crate::page::Document;
use crate::widget::PaymentWidget;

/// Something the buyer did on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// A form input changed.
    Input { name: String, value: String },
    /// The "same as shipping" checkbox changed.
    SameAddressToggled(bool),
    /// The checkout form was submitted.
    SubmitOrder,
    /// The complete-payment control was clicked.
    CompletePayment,
}

#[derive(Debug)]
enum Flow {
    Fresh(FreshCheckout),
    Resuming(ResumingPayment),
}

/// Checkout controller for one page.
pub struct CheckoutFlowController<A, W, B> {
    config: CheckoutConfig,
    document: Document,
    api: A,
    widget: W,
    browser: B,
    flow: Flow,
}

impl<A, W, B> CheckoutFlowController<A, W, B>
where
    A: OrderApi,
    W: PaymentWidget,
    B: Browser,
{
    /// Detect the page mode and wire the matching handler.
    ///
    /// In resuming mode this mounts the payment widget right away.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Config`] when the page has no usable
    /// publishable key. Nothing is wired in that case.
    pub async fn initialize(
        config: CheckoutConfig,
        mut document: Document,
        api: A,
        mut widget: W,
        mut browser: B,
    ) -> Result<Self> {
        let detection = mode::detect(&document).inspect_err(|e| {
            error!(error = %e, "Checkout disabled: payment configuration missing");
        })?;
        widget.configure(&detection.publishable_key);
        info!(mode = ?detection.mode.kind(), "Checkout initialized");

        let flow = match detection.mode {
            DetectedMode::Fresh => {
                let fresh = FreshCheckout::new();
                fresh.render(&mut document);
                Flow::Fresh(fresh)
            }
            DetectedMode::Resuming(params) => {
                let mut cx = FlowContext {
                    config: &config,
                    document: &mut document,
                    api: &api,
                    widget: &mut widget,
                    browser: &mut browser,
                };
                Flow::Resuming(ResumingPayment::initialize(params, &mut cx).await)
            }
        };

        Ok(Self {
            config,
            document,
            api,
            widget,
            browser,
            flow,
        })
    }

    /// Handle one page event.
    ///
    /// Input and checkbox events only touch the form. Submissions run the
    /// active handler; their failures have already been shown to the buyer
    /// when this returns.
    ///
    /// # Errors
    ///
    /// Returns the failure of the step the event triggered.
    pub async fn dispatch(&mut self, event: PageEvent) -> Result<()> {
        let Self {
            config,
            document,
            api,
            widget,
            browser,
            flow,
        } = self;

        match event {
            PageEvent::Input { name, value } => {
                if document.form.set_value(&name, &value) {
                    billing::mirror_shipping_input(document, &name);
                }
                Ok(())
            }
            PageEvent::SameAddressToggled(checked) => {
                billing::set_same_address(document, checked);
                Ok(())
            }
            trigger @ (PageEvent::SubmitOrder | PageEvent::CompletePayment) => {
                let mut cx = FlowContext {
                    config,
                    document,
                    api,
                    widget,
                    browser,
                };
                match (flow, trigger) {
                    (Flow::Fresh(fresh), _) => fresh.submit(&mut cx).await,
                    (Flow::Resuming(resuming), PageEvent::CompletePayment) => {
                        resuming.complete_payment(&mut cx).await
                    }
                    (Flow::Resuming(resuming), _) => Err(CheckoutError::from(TransitionError {
                        state: resuming.state().name(),
                        action: "submit an order",
                    })),
                }
            }
        }
    }

    #[must_use]
    pub const fn mode(&self) -> CheckoutMode {
        match self.flow {
            Flow::Fresh(_) => CheckoutMode::Fresh,
            Flow::Resuming(_) => CheckoutMode::Resuming,
        }
    }

    /// Fresh-checkout state, in fresh mode.
    #[must_use]
    pub const fn fresh_state(&self) -> Option<&CheckoutState> {
        match &self.flow {
            Flow::Fresh(fresh) => Some(fresh.state()),
            Flow::Resuming(_) => None,
        }
    }

    /// Resuming-payment state, in resuming mode.
    #[must_use]
    pub const fn resuming_state(&self) -> Option<&ResumingState> {
        match &self.flow {
            Flow::Resuming(resuming) => Some(resuming.state()),
            Flow::Fresh(_) => None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub const fn widget(&self) -> &W {
        &self.widget
    }

    #[must_use]
    pub const fn browser(&self) -> &B {
        &self.browser
    }
}
