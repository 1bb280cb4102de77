//! Fresh checkout: create the order, start its payment intent, then
//! confirm the payment through the widget.

use std::mem;
use std::time::Duration;

use gallery_checkout_core::OrderId;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    ControlView, FlowContext, PaymentIntentHandle, TransitionError, bounded, confirm_payment,
    labels, payment_failure_message,
};
use crate::api::{ApiError, CsrfToken, OrderApi, StartedPayment};
use crate::browser::Browser;
use crate::error::CheckoutError;
use crate::page::Document;
use crate::session::CheckoutSession;
use crate::widget::PaymentWidget;

/// Business state of a fresh checkout.
#[derive(Debug, Clone, Default)]
pub enum CheckoutState {
    /// Form is editable; submitting creates an order.
    #[default]
    Editing,
    /// Order and payment intent requests are in flight.
    Ordering,
    /// The widget is mounted for an order; submitting confirms payment.
    Paying(PaymentIntentHandle),
    /// Payment confirmation is in flight.
    Confirming(PaymentIntentHandle),
    /// Payment succeeded; the page is navigating away.
    Succeeded(OrderId),
}

impl CheckoutState {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Editing => "editing",
            Self::Ordering => "ordering",
            Self::Paying(_) => "paying",
            Self::Confirming(_) => "confirming",
            Self::Succeeded(_) => "succeeded",
        }
    }

    /// How the submit control renders in this state.
    #[must_use]
    pub const fn control(&self) -> ControlView {
        match self {
            Self::Editing => ControlView::enabled(labels::PLACE_ORDER),
            Self::Ordering | Self::Confirming(_) => ControlView::busy(labels::PROCESSING),
            Self::Paying(_) => ControlView::enabled(labels::COMPLETE_PAYMENT),
            Self::Succeeded(_) => ControlView::busy(labels::REDIRECTING),
        }
    }

    /// The order handle, once a payment intent exists.
    #[must_use]
    pub const fn payment(&self) -> Option<&PaymentIntentHandle> {
        match self {
            Self::Paying(handle) | Self::Confirming(handle) => Some(handle),
            _ => None,
        }
    }

    fn illegal(&self, action: &'static str) -> TransitionError {
        TransitionError {
            state: self.name(),
            action,
        }
    }

    /// `Editing -> Ordering`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] from any other state.
    pub fn begin_ordering(&mut self) -> Result<(), TransitionError> {
        match self {
            Self::Editing => {
                *self = Self::Ordering;
                Ok(())
            }
            _ => Err(self.illegal("place an order")),
        }
    }

    /// `Ordering -> Editing`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] from any other state.
    pub fn fail_ordering(&mut self) -> Result<(), TransitionError> {
        match self {
            Self::Ordering => {
                *self = Self::Editing;
                Ok(())
            }
            _ => Err(self.illegal("abandon an order")),
        }
    }

    /// `Ordering -> Paying`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] from any other state.
    pub fn start_paying(&mut self, handle: PaymentIntentHandle) -> Result<(), TransitionError> {
        match self {
            Self::Ordering => {
                *self = Self::Paying(handle);
                Ok(())
            }
            _ => Err(self.illegal("start paying")),
        }
    }

    /// `Paying -> Confirming`, returning the handle to confirm.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] from any other state.
    pub fn begin_confirming(&mut self) -> Result<PaymentIntentHandle, TransitionError> {
        match mem::take(self) {
            Self::Paying(handle) => {
                *self = Self::Confirming(handle.clone());
                Ok(handle)
            }
            other => {
                *self = other;
                Err(self.illegal("confirm the payment"))
            }
        }
    }

    /// `Confirming -> Paying`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] from any other state.
    pub fn fail_confirming(&mut self) -> Result<(), TransitionError> {
        match mem::take(self) {
            Self::Confirming(handle) => {
                *self = Self::Paying(handle);
                Ok(())
            }
            other => {
                *self = other;
                Err(self.illegal("retry the payment"))
            }
        }
    }

    /// `Confirming -> Succeeded`, returning the paid order.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] from any other state.
    pub fn succeed(&mut self) -> Result<OrderId, TransitionError> {
        match self {
            Self::Confirming(handle) => {
                let order_id = handle.order_id;
                *self = Self::Succeeded(order_id);
                Ok(order_id)
            }
            _ => Err(self.illegal("complete the payment")),
        }
    }
}

/// Fresh-checkout handler driving the submit control.
#[derive(Debug, Default)]
pub struct FreshCheckout {
    state: CheckoutState,
}

impl FreshCheckout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Render the submit control from the current state.
    pub fn render(&self, document: &mut Document) {
        self.state.control().apply(document.submit_button.as_mut());
    }

    /// Handle a submission of the checkout form.
    ///
    /// While editing this places the order; once the widget is mounted it
    /// confirms the payment instead. Failures are alerted and the control is
    /// restored before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns the failure of the attempted step, or a
    /// [`TransitionError`] while a request is already in flight.
    pub async fn submit<A, W, B>(
        &mut self,
        cx: &mut FlowContext<'_, A, W, B>,
    ) -> Result<(), CheckoutError>
    where
        A: OrderApi,
        W: PaymentWidget,
        B: Browser,
    {
        match self.state {
            CheckoutState::Editing => self.place_order(cx).await,
            CheckoutState::Paying(_) => self.confirm(cx).await,
            _ => Err(self.state.illegal("submit the checkout form").into()),
        }
    }

    #[instrument(skip_all)]
    async fn place_order<A, W, B>(
        &mut self,
        cx: &mut FlowContext<'_, A, W, B>,
    ) -> Result<(), CheckoutError>
    where
        A: OrderApi,
        W: PaymentWidget,
        B: Browser,
    {
        self.state.begin_ordering()?;
        self.render(cx.document);

        match open_payment(cx).await {
            Ok(handle) => {
                info!(order_id = %handle.order_id, "Order created, payment form mounted");
                self.state.start_paying(handle)?;
                self.render(cx.document);
                Ok(())
            }
            Err(error) => {
                warn!(error = %error, "Order placement failed");
                self.state.fail_ordering()?;
                self.render(cx.document);
                cx.browser.alert(&order_failure_message(&error));
                Err(error)
            }
        }
    }

    #[instrument(skip_all)]
    async fn confirm<A, W, B>(&mut self, cx: &mut FlowContext<'_, A, W, B>) -> Result<(), CheckoutError>
    where
        A: OrderApi,
        W: PaymentWidget,
        B: Browser,
    {
        let handle = self.state.begin_confirming()?;
        self.render(cx.document);

        let return_url = cx.absolute(&cx.success_path(Some(handle.order_id)));
        let confirmed = confirm_payment(
            &mut *cx.widget,
            &handle.client_secret,
            &return_url,
            true,
        )
        .await;

        match confirmed {
            Ok(intent) => {
                let order_id = self.state.succeed()?;
                self.render(cx.document);
                info!(%order_id, intent = ?intent.id, "Payment confirmed");
                let destination = cx.success_path(Some(order_id));
                cx.browser.navigate(&destination);
                Ok(())
            }
            Err(error) => {
                warn!(order_id = %handle.order_id, error = %error, "Payment confirmation failed");
                self.state.fail_confirming()?;
                self.render(cx.document);
                cx.browser.alert(&payment_failure_message(&error));
                Err(error)
            }
        }
    }
}

/// Create the order, start its payment intent and mount the widget.
async fn open_payment<A, W, B>(
    cx: &mut FlowContext<'_, A, W, B>,
) -> Result<PaymentIntentHandle, CheckoutError>
where
    A: OrderApi,
    W: PaymentWidget,
    B: Browser,
{
    let session = CheckoutSession::collect(cx.document)?;
    let csrf = session.csrf_token.as_ref();
    let timeout = cx.config.timeout;

    let order = bounded(
        "creating the order",
        timeout,
        cx.api.create_order(&session.order_request(), csrf),
    )
    .await?;

    let started = start_payment(cx.api, order.id, csrf, timeout).await?;

    bounded(
        "mounting the payment form",
        timeout,
        cx.widget.mount(&started.client_secret),
    )
    .await?;

    Ok(PaymentIntentHandle {
        order_id: order.id,
        client_secret: started.client_secret,
        payment_id: started.payment_id,
    })
}

/// Start the payment intent for a newly created order.
///
/// One idempotency key is minted per order. A call that timed out or never
/// reached the server is retried once with that same key, so the backend
/// hands back the intent it may already have created.
async fn start_payment<A: OrderApi>(
    api: &A,
    order_id: OrderId,
    csrf: Option<&CsrfToken>,
    timeout: Duration,
) -> Result<StartedPayment, CheckoutError> {
    let idempotency_key = Uuid::new_v4().to_string();
    let attempt = || {
        bounded(
            "starting the payment",
            timeout,
            api.start_payment(order_id, csrf, &idempotency_key),
        )
    };

    match attempt().await {
        Err(error @ (CheckoutError::Timeout { .. } | CheckoutError::Api(ApiError::Http(_)))) => {
            warn!(%order_id, error = %error, "Retrying payment start");
            attempt().await
        }
        result => result,
    }
}

/// Buyer-facing message for a failed order placement.
fn order_failure_message(error: &CheckoutError) -> String {
    let detail = match error {
        CheckoutError::Api(api) => api.user_message(),
        CheckoutError::Session(session) => session.to_string(),
        CheckoutError::Widget(widget) => widget.to_string(),
        CheckoutError::Timeout { .. } => "the server took too long to respond".to_string(),
        other => other.to_string(),
    };
    format!("There was an error processing your order: {detail}. Please try again.")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gallery_checkout_core::PaymentIntentStatus;

    use super::*;
    use crate::config::CheckoutConfig;
    use crate::testing::{
        ApiCall, MemoryOrderApi, RecordingBrowser, ScriptedWidget, fixtures, intent_with,
    };
    use crate::widget::WidgetError;

    struct Harness {
        config: CheckoutConfig,
        document: Document,
        api: MemoryOrderApi,
        widget: ScriptedWidget,
        browser: RecordingBrowser,
        checkout: FreshCheckout,
    }

    impl Harness {
        fn new(api: MemoryOrderApi) -> Self {
            Self {
                config: fixtures::test_config(),
                document: fixtures::checkout_document(),
                api,
                widget: ScriptedWidget::default(),
                browser: RecordingBrowser::default(),
                checkout: FreshCheckout::new(),
            }
        }

        async fn submit(&mut self) -> Result<(), CheckoutError> {
            let mut cx = FlowContext {
                config: &self.config,
                document: &mut self.document,
                api: &self.api,
                widget: &mut self.widget,
                browser: &mut self.browser,
            };
            self.checkout.submit(&mut cx).await
        }

        fn button(&self) -> (&str, bool) {
            let button = self.document.submit_button.as_ref().unwrap();
            (button.label.as_str(), !button.disabled)
        }
    }

    #[tokio::test]
    async fn test_order_then_confirm_reaches_success_page() {
        let mut h = Harness::new(MemoryOrderApi::new(42, "cs_test_1"));

        h.submit().await.unwrap();
        assert!(matches!(h.checkout.state(), CheckoutState::Paying(_)));
        assert_eq!(h.widget.mounted, ["cs_test_1"]);
        assert_eq!(h.button(), ("Complete Payment", true));

        let calls = h.api.calls();
        assert_eq!(calls.len(), 2);
        let ApiCall::StartPayment {
            order_id,
            csrf,
            idempotency_key,
        } = &calls[1]
        else {
            panic!("expected start-payment call, got {:?}", calls[1]);
        };
        assert_eq!(*order_id, OrderId::new(42));
        assert_eq!(csrf.as_deref(), Some(fixtures::CSRF_TOKEN));
        assert!(Uuid::parse_str(idempotency_key).is_ok());

        h.submit().await.unwrap();
        assert_eq!(h.widget.submits, 1);
        assert_eq!(
            h.widget.confirms,
            [(
                "cs_test_1".to_string(),
                "https://shop.test/orders/order/42/success/".to_string()
            )]
        );
        assert_eq!(h.browser.navigations, ["/orders/order/42/success/"]);
        assert!(matches!(h.checkout.state(), CheckoutState::Succeeded(id) if id.as_i64() == 42));
        assert_eq!(h.button(), ("Redirecting...", false));
        assert_eq!(h.api.create_order_calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_order_creation_restores_control() {
        let api = MemoryOrderApi::new(42, "cs_test_1").with_create_order_failure(400, "Cart is empty");
        let mut h = Harness::new(api);

        let err = h.submit().await.unwrap_err();
        assert!(matches!(err, CheckoutError::Api(_)));
        assert_eq!(h.api.start_payment_calls(), 0);
        assert!(h.widget.mounted.is_empty());
        assert_eq!(h.button(), ("Place Order", true));
        assert!(matches!(h.checkout.state(), CheckoutState::Editing));
        assert_eq!(
            h.browser.alerts,
            ["There was an error processing your order: Cart is empty. Please try again."]
        );
    }

    #[tokio::test]
    async fn test_failed_payment_start_returns_to_editing() {
        let api = MemoryOrderApi::new(42, "cs_test_1").with_start_payment_failure(502, "");
        let mut h = Harness::new(api);

        assert!(h.submit().await.is_err());
        assert!(matches!(h.checkout.state(), CheckoutState::Editing));
        assert!(h.browser.alerts[0].contains("status 502"));
        assert!(h.widget.mounted.is_empty());
    }

    #[tokio::test]
    async fn test_mount_failure_returns_to_editing() {
        let mut h = Harness::new(MemoryOrderApi::new(42, "cs_test_1"));
        h.widget = ScriptedWidget::default()
            .with_mount_failure(WidgetError::Exception("element not found".into()));

        assert!(h.submit().await.is_err());
        assert!(matches!(h.checkout.state(), CheckoutState::Editing));
        assert_eq!(h.button(), ("Place Order", true));
        assert_eq!(h.browser.alerts.len(), 1);
    }

    #[tokio::test]
    async fn test_declined_card_stays_paying_and_retries() {
        let mut h = Harness::new(MemoryOrderApi::new(7, "cs_test_7"));
        h.widget = ScriptedWidget::default().queue_confirm(Err(WidgetError::Rejected {
            message: "Your card was declined.".into(),
        }));

        h.submit().await.unwrap();
        assert!(h.submit().await.is_err());
        assert!(matches!(h.checkout.state(), CheckoutState::Paying(_)));
        assert_eq!(h.button(), ("Complete Payment", true));
        assert_eq!(h.browser.alerts, ["Payment failed: Your card was declined."]);
        assert!(h.browser.navigations.is_empty());

        h.submit().await.unwrap();
        assert_eq!(h.browser.navigations, ["/orders/order/7/success/"]);
        assert_eq!(h.api.create_order_calls(), 1);
        assert_eq!(h.widget.mounted.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_error_skips_confirmation() {
        let mut h = Harness::new(MemoryOrderApi::new(7, "cs_test_7"));
        h.widget = ScriptedWidget::default().queue_submit(Err(WidgetError::Rejected {
            message: "Your card number is incomplete.".into(),
        }));

        h.submit().await.unwrap();
        assert!(h.submit().await.is_err());
        assert!(h.widget.confirms.is_empty());
        assert_eq!(h.browser.alerts, ["Payment failed: Your card number is incomplete."]);
    }

    #[tokio::test]
    async fn test_unsettled_intent_is_retryable() {
        let mut h = Harness::new(MemoryOrderApi::new(7, "cs_test_7"));
        h.widget = ScriptedWidget::default()
            .queue_confirm(Ok(intent_with(PaymentIntentStatus::RequiresAction)));

        h.submit().await.unwrap();
        let err = h.submit().await.unwrap_err();
        assert!(matches!(err, CheckoutError::PaymentIncomplete(_)));
        assert!(matches!(h.checkout.state(), CheckoutState::Paying(_)));
        assert_eq!(
            h.browser.alerts,
            ["Payment was not completed (status: requires_action). Please try again."]
        );
    }

    #[tokio::test]
    async fn test_missing_shipping_field_makes_no_request() {
        let mut h = Harness::new(MemoryOrderApi::new(42, "cs_test_1"));
        h.document.form.set_value("shipping_city", " ");

        let err = h.submit().await.unwrap_err();
        assert!(matches!(err, CheckoutError::Session(_)));
        assert!(h.api.calls().is_empty());
        assert_eq!(h.button(), ("Place Order", true));
        assert!(h.browser.alerts[0].contains("missing city"));
    }

    #[tokio::test]
    async fn test_hanging_order_request_times_out() {
        let api = MemoryOrderApi::new(42, "cs_test_1").with_hanging_create_order();
        let mut h = Harness::new(api);
        h.config.timeout = Duration::from_millis(20);

        let err = h.submit().await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Timeout {
                operation: "creating the order",
                ..
            }
        ));
        assert!(err.is_recoverable());
        assert_eq!(h.button(), ("Place Order", true));
        assert_eq!(h.api.start_payment_calls(), 0);
    }

    #[tokio::test]
    async fn test_slow_confirmation_outlives_call_timeout() {
        let mut h = Harness::new(MemoryOrderApi::new(42, "cs_test_1"));
        h.config.timeout = Duration::from_millis(20);
        h.widget = ScriptedWidget::default().with_confirm_delay(Duration::from_millis(80));

        h.submit().await.unwrap();
        h.submit().await.unwrap();
        assert_eq!(h.widget.confirms.len(), 1);
        assert!(h.browser.alerts.is_empty());
        assert_eq!(h.browser.navigations, ["/orders/order/42/success/"]);
        assert!(matches!(h.checkout.state(), CheckoutState::Succeeded(_)));
    }

    #[tokio::test]
    async fn test_payment_start_retry_reuses_idempotency_key() {
        let api = MemoryOrderApi::new(42, "cs_test_1").with_hanging_start_payment(1);
        let mut h = Harness::new(api);
        h.config.timeout = Duration::from_millis(20);

        h.submit().await.unwrap();
        let keys: Vec<String> = h
            .api
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::StartPayment {
                    idempotency_key, ..
                } => Some(idempotency_key),
                ApiCall::CreateOrder { .. } => None,
            })
            .collect();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], keys[1]);
        assert_eq!(h.api.create_order_calls(), 1);
        assert_eq!(h.widget.mounted, ["cs_test_1"]);
        assert!(matches!(h.checkout.state(), CheckoutState::Paying(_)));
    }

    #[tokio::test]
    async fn test_payment_start_is_retried_only_once() {
        let api = MemoryOrderApi::new(42, "cs_test_1").with_hanging_start_payment(2);
        let mut h = Harness::new(api);
        h.config.timeout = Duration::from_millis(20);

        let err = h.submit().await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Timeout {
                operation: "starting the payment",
                ..
            }
        ));
        assert_eq!(h.api.start_payment_calls(), 2);
        assert!(matches!(h.checkout.state(), CheckoutState::Editing));
        assert_eq!(h.button(), ("Place Order", true));
    }

    #[tokio::test]
    async fn test_rejected_payment_start_is_not_retried() {
        let api = MemoryOrderApi::new(42, "cs_test_1")
            .with_start_payment_failure(409, "Order already paid");
        let mut h = Harness::new(api);

        assert!(h.submit().await.is_err());
        assert_eq!(h.api.start_payment_calls(), 1);
    }

    #[test]
    fn test_transitions_out_of_order_are_rejected() {
        let mut state = CheckoutState::default();
        let err = state.begin_confirming().unwrap_err();
        assert_eq!(err.to_string(), "cannot confirm the payment while editing");
        assert!(matches!(state, CheckoutState::Editing));

        state.begin_ordering().unwrap();
        assert!(state.begin_ordering().is_err());
        assert!(state.succeed().is_err());
        assert!(matches!(state, CheckoutState::Ordering));
        assert_eq!(state.control(), ControlView::busy(labels::PROCESSING));
    }
}
