//! Completing a payment whose intent was created on an earlier visit.

use std::mem;

use gallery_checkout_core::OrderId;
use tracing::{debug, info, warn};

use super::{
    ControlView, FlowContext, TransitionError, bounded, confirm_payment, labels,
    payment_failure_message,
};
use crate::api::{ClientSecret, OrderApi};
use crate::browser::Browser;
use crate::error::CheckoutError;
use crate::mode::ResumeParams;
use crate::page::Document;
use crate::widget::PaymentWidget;

/// The intent being completed.
#[derive(Debug, Clone)]
pub struct ResumeHandle {
    pub client_secret: ClientSecret,
    pub order_id: Option<OrderId>,
}

/// Business state of a payment-completion view.
#[derive(Debug, Clone, Default)]
pub enum ResumingState {
    /// Nothing mounted; the complete-payment control is not wired.
    #[default]
    Inert,
    Ready(ResumeHandle),
    Confirming(ResumeHandle),
    Succeeded,
}

impl ResumingState {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Inert => "inert",
            Self::Ready(_) => "ready",
            Self::Confirming(_) => "confirming",
            Self::Succeeded => "succeeded",
        }
    }

    /// How the complete-payment control renders. An inert view leaves it
    /// untouched.
    #[must_use]
    pub const fn control(&self) -> Option<ControlView> {
        match self {
            Self::Inert => None,
            Self::Ready(_) => Some(ControlView::enabled(labels::COMPLETE_PAYMENT)),
            Self::Confirming(_) => Some(ControlView::busy(labels::PROCESSING)),
            Self::Succeeded => Some(ControlView::busy(labels::REDIRECTING)),
        }
    }

    /// `Ready -> Confirming`, returning the handle to confirm.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] from any other state.
    pub fn begin_confirming(&mut self) -> Result<ResumeHandle, TransitionError> {
        match mem::take(self) {
            Self::Ready(handle) => {
                *self = Self::Confirming(handle.clone());
                Ok(handle)
            }
            other => {
                *self = other;
                Err(TransitionError {
                    state: self.name(),
                    action: "complete the payment",
                })
            }
        }
    }

    /// `Confirming -> Ready`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] from any other state.
    pub fn fail_confirming(&mut self) -> Result<(), TransitionError> {
        match mem::take(self) {
            Self::Confirming(handle) => {
                *self = Self::Ready(handle);
                Ok(())
            }
            other => {
                *self = other;
                Err(TransitionError {
                    state: self.name(),
                    action: "retry the payment",
                })
            }
        }
    }

    /// `Confirming -> Succeeded`, returning the order id if known.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] from any other state.
    pub fn succeed(&mut self) -> Result<Option<OrderId>, TransitionError> {
        match self {
            Self::Confirming(handle) => {
                let order_id = handle.order_id;
                *self = Self::Succeeded;
                Ok(order_id)
            }
            _ => Err(TransitionError {
                state: self.name(),
                action: "finish the payment",
            }),
        }
    }
}

/// Resuming-payment handler driving the complete-payment control.
#[derive(Debug, Default)]
pub struct ResumingPayment {
    state: ResumingState,
}

impl ResumingPayment {
    /// Mount the widget for the intent named in the URL.
    ///
    /// Stays inert without a client secret, a payment element or a
    /// complete-payment control. A mount failure is alerted and also leaves
    /// the view inert.
    pub async fn initialize<A, W, B>(params: ResumeParams, cx: &mut FlowContext<'_, A, W, B>) -> Self
    where
        A: OrderApi,
        W: PaymentWidget,
        B: Browser,
    {
        let Some(client_secret) = params.client_secret else {
            debug!("No client secret in URL, payment view stays inert");
            return Self::default();
        };
        if !cx.document.payment_element || cx.document.complete_payment_button.is_none() {
            debug!("Payment element or control missing, payment view stays inert");
            return Self::default();
        }

        let mounted = bounded(
            "mounting the payment form",
            cx.config.timeout,
            cx.widget.mount(&client_secret),
        )
        .await;
        if let Err(error) = mounted {
            warn!(error = %error, "Could not mount payment form");
            cx.browser.alert(&payment_failure_message(&error));
            return Self::default();
        }

        let this = Self {
            state: ResumingState::Ready(ResumeHandle {
                client_secret,
                order_id: params.order_id,
            }),
        };
        this.render(cx.document);
        this
    }

    #[must_use]
    pub const fn state(&self) -> &ResumingState {
        &self.state
    }

    pub fn render(&self, document: &mut Document) {
        if let Some(view) = self.state.control() {
            view.apply(document.complete_payment_button.as_mut());
        }
    }

    /// Handle a click on the complete-payment control.
    ///
    /// Confirms the intent once. On success the buyer is sent to the order's
    /// success page, or the orders page when the order id is unknown. An inert
    /// view ignores the click.
    ///
    /// # Errors
    ///
    /// Returns the confirmation failure after alerting it, or a
    /// [`TransitionError`] while a confirmation is in flight.
    pub async fn complete_payment<A, W, B>(
        &mut self,
        cx: &mut FlowContext<'_, A, W, B>,
    ) -> Result<(), CheckoutError>
    where
        A: OrderApi,
        W: PaymentWidget,
        B: Browser,
    {
        if matches!(self.state, ResumingState::Inert) {
            debug!("Ignoring complete-payment click on inert view");
            return Ok(());
        }

        let handle = self.state.begin_confirming()?;
        self.render(cx.document);

        let return_url = cx.absolute(&cx.success_path(handle.order_id));
        let confirmed = confirm_payment(
            &mut *cx.widget,
            &handle.client_secret,
            &return_url,
            false,
        )
        .await;

        match confirmed {
            Ok(_) => {
                let order_id = self.state.succeed()?;
                self.render(cx.document);
                let destination = cx.success_path(order_id);
                info!(order_id = ?order_id, %destination, "Resumed payment confirmed");
                cx.browser.navigate(&destination);
                Ok(())
            }
            Err(error) => {
                warn!(error = %error, "Resumed payment confirmation failed");
                self.state.fail_confirming()?;
                self.render(cx.document);
                cx.browser.alert(&payment_failure_message(&error));
                Err(error)
            }
        }
    }
}
