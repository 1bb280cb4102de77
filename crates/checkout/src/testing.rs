//! In-memory fakes for the order API, payment widget and browser, plus
//! page fixtures.
//!
//! Compiled for unit tests and behind the `testing` feature for
//! integration tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

use gallery_checkout_core::{OrderId, OrderRequest, OrderResult, PaymentId, PaymentIntentStatus};

use crate::api::{ApiError, ClientSecret, CsrfToken, OrderApi, StartedPayment};
use crate::config::PublishableKey;
use crate::widget::{ConfirmedIntent, PaymentWidget, WidgetError};

/// A request received by [`MemoryOrderApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    CreateOrder {
        request: OrderRequest,
        csrf: Option<String>,
    },
    StartPayment {
        order_id: OrderId,
        csrf: Option<String>,
        idempotency_key: String,
    },
}

#[derive(Debug, Clone)]
enum Reply {
    Succeed,
    Fail { status: u16, message: String },
    Hang,
}

impl Reply {
    async fn settle<T>(&self, success: T) -> Result<T, ApiError> {
        match self {
            Self::Succeed => Ok(success),
            Self::Fail { status, message } => Err(ApiError::Api {
                status: *status,
                message: message.clone(),
            }),
            Self::Hang => std::future::pending().await,
        }
    }
}

/// Order API answering from memory and recording every call.
#[derive(Debug)]
pub struct MemoryOrderApi {
    order_id: OrderId,
    client_secret: String,
    create_order: Reply,
    start_payment: Reply,
    start_payment_hangs: Cell<usize>,
    calls: RefCell<Vec<ApiCall>>,
}

impl MemoryOrderApi {
    /// API that creates order `order_id` and starts an intent with
    /// `client_secret`.
    #[must_use]
    pub fn new(order_id: i64, client_secret: &str) -> Self {
        Self {
            order_id: OrderId::new(order_id),
            client_secret: client_secret.to_string(),
            create_order: Reply::Succeed,
            start_payment: Reply::Succeed,
            start_payment_hangs: Cell::new(0),
            calls: RefCell::default(),
        }
    }

    #[must_use]
    pub fn with_create_order_failure(mut self, status: u16, message: &str) -> Self {
        self.create_order = Reply::Fail {
            status,
            message: message.to_string(),
        };
        self
    }

    #[must_use]
    pub fn with_start_payment_failure(mut self, status: u16, message: &str) -> Self {
        self.start_payment = Reply::Fail {
            status,
            message: message.to_string(),
        };
        self
    }

    /// Order creation never answers.
    #[must_use]
    pub fn with_hanging_create_order(mut self) -> Self {
        self.create_order = Reply::Hang;
        self
    }

    /// The first `times` start-payment calls never answer.
    #[must_use]
    pub fn with_hanging_start_payment(self, times: usize) -> Self {
        self.start_payment_hangs.set(times);
        self
    }

    /// Calls received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.borrow().clone()
    }

    #[must_use]
    pub fn create_order_calls(&self) -> usize {
        self.count(|call| matches!(call, ApiCall::CreateOrder { .. }))
    }

    #[must_use]
    pub fn start_payment_calls(&self) -> usize {
        self.count(|call| matches!(call, ApiCall::StartPayment { .. }))
    }

    fn count(&self, predicate: impl Fn(&ApiCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| predicate(call)).count()
    }
}

impl OrderApi for MemoryOrderApi {
    async fn create_order(
        &self,
        order: &OrderRequest,
        csrf: Option<&CsrfToken>,
    ) -> Result<OrderResult, ApiError> {
        self.calls.borrow_mut().push(ApiCall::CreateOrder {
            request: order.clone(),
            csrf: csrf.map(|t| t.expose().to_string()),
        });
        self.create_order
            .settle(OrderResult {
                id: self.order_id,
                order_number: Some(format!("GAL-{:05}", self.order_id.as_i64())),
                status: None,
                total: None,
            })
            .await
    }

    async fn start_payment(
        &self,
        order_id: OrderId,
        csrf: Option<&CsrfToken>,
        idempotency_key: &str,
    ) -> Result<StartedPayment, ApiError> {
        self.calls.borrow_mut().push(ApiCall::StartPayment {
            order_id,
            csrf: csrf.map(|t| t.expose().to_string()),
            idempotency_key: idempotency_key.to_string(),
        });
        let hangs = self.start_payment_hangs.get();
        if hangs > 0 {
            self.start_payment_hangs.set(hangs - 1);
            return std::future::pending().await;
        }
        self.start_payment
            .settle(StartedPayment {
                client_secret: ClientSecret::new(self.client_secret.clone()),
                payment_id: Some(PaymentId::new(order_id.as_i64())),
            })
            .await
    }
}

/// A confirmation result with `status`.
#[must_use]
pub fn intent_with(status: PaymentIntentStatus) -> ConfirmedIntent {
    ConfirmedIntent {
        id: Some("pi_test_1".to_string()),
        status,
    }
}

/// Payment widget with scripted results.
///
/// Submissions succeed and confirmations report `succeeded` unless results
/// were queued.
#[derive(Debug, Default)]
pub struct ScriptedWidget {
    /// Publishable key passed to `configure`.
    pub configured_key: Option<String>,
    /// Client secrets mounted, in order.
    pub mounted: Vec<String>,
    pub submits: usize,
    /// `(client_secret, return_url)` per confirmation.
    pub confirms: Vec<(String, String)>,
    mount_failure: Option<WidgetError>,
    confirm_delay: Option<Duration>,
    submit_results: VecDeque<Result<(), WidgetError>>,
    confirm_results: VecDeque<Result<ConfirmedIntent, WidgetError>>,
}

impl ScriptedWidget {
    #[must_use]
    pub fn with_mount_failure(mut self, error: WidgetError) -> Self {
        self.mount_failure = Some(error);
        self
    }

    /// Each confirmation takes `delay` to settle, as a buyer working
    /// through a challenge would.
    #[must_use]
    pub const fn with_confirm_delay(mut self, delay: Duration) -> Self {
        self.confirm_delay = Some(delay);
        self
    }

    #[must_use]
    pub fn queue_submit(mut self, result: Result<(), WidgetError>) -> Self {
        self.submit_results.push_back(result);
        self
    }

    #[must_use]
    pub fn queue_confirm(mut self, result: Result<ConfirmedIntent, WidgetError>) -> Self {
        self.confirm_results.push_back(result);
        self
    }
}

impl PaymentWidget for ScriptedWidget {
    fn configure(&mut self, publishable_key: &PublishableKey) {
        self.configured_key = Some(publishable_key.as_str().to_string());
    }

    async fn mount(&mut self, client_secret: &ClientSecret) -> Result<(), WidgetError> {
        if let Some(error) = self.mount_failure.clone() {
            return Err(error);
        }
        self.mounted.push(client_secret.expose().to_string());
        Ok(())
    }

    async fn submit(&mut self) -> Result<(), WidgetError> {
        self.submits += 1;
        self.submit_results.pop_front().unwrap_or(Ok(()))
    }

    async fn confirm(
        &mut self,
        client_secret: &ClientSecret,
        return_url: &str,
    ) -> Result<ConfirmedIntent, WidgetError> {
        self.confirms
            .push((client_secret.expose().to_string(), return_url.to_string()));
        if let Some(delay) = self.confirm_delay {
            tokio::time::sleep(delay).await;
        }
        self.confirm_results
            .pop_front()
            .unwrap_or_else(|| Ok(intent_with(PaymentIntentStatus::Succeeded)))
    }
}

/// Browser that records navigations and alerts.
#[derive(Debug, Default)]
pub struct RecordingBrowser {
    pub navigations: Vec<String>,
    pub alerts: Vec<String>,
}

impl crate::browser::Browser for RecordingBrowser {
    fn navigate(&mut self, location: &str) {
        self.navigations.push(location.to_string());
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}

/// Page fixtures.
pub mod fixtures {
    use url::Url;

    use crate::config::CheckoutConfig;
    use crate::flow::labels;
    use crate::page::{
        CSRF_FIELD, CartLineMarkup, Control, Document, Field, FieldKind, Form, GUEST_EMAIL_FIELD,
        META_PUBLISHABLE_KEY,
    };

    pub const CSRF_TOKEN: &str = "csrf-test-token";
    pub const PUBLISHABLE_KEY: &str = "pk_test_51GalleryCheckout";

    const SHIPPING: [(&str, &str); 8] = [
        ("shipping_full_name", "Aoife Byrne"),
        ("shipping_line1", "12 Quay Street"),
        ("shipping_line2", ""),
        ("shipping_city", "Dublin"),
        ("shipping_region", ""),
        ("shipping_postal_code", "D02 XY45"),
        ("shipping_country", "IE"),
        ("shipping_phone", ""),
    ];

    const BILLING: [(&str, &str); 8] = [
        ("billing_full_name", "Aoife Byrne"),
        ("billing_line1", "3 Mardyke Walk"),
        ("billing_line2", ""),
        ("billing_city", "Cork"),
        ("billing_region", ""),
        ("billing_postal_code", "T12 K8AF"),
        ("billing_country", "IE"),
        ("billing_phone", ""),
    ];

    /// Configuration for a backend at `https://shop.test/`.
    #[must_use]
    pub fn test_config() -> CheckoutConfig {
        #[allow(clippy::expect_used)]
        let base = Url::parse("https://shop.test/").expect("fixture URL is valid");
        CheckoutConfig::new(base)
    }

    fn input(value: &str, required: bool) -> Field {
        Field {
            value: value.to_string(),
            required,
            kind: FieldKind::Input,
        }
    }

    fn line(title: &str, sku: Option<&str>, price: &str, quantity: &str) -> CartLineMarkup {
        CartLineMarkup {
            title: Some(title.to_string()),
            sku: sku.map(str::to_string),
            price: Some(price.to_string()),
            quantity: Some(quantity.to_string()),
        }
    }

    /// A guest checkout form with a complete shipping address, "same as
    /// shipping" checked and two cart lines.
    #[must_use]
    pub fn checkout_document() -> Document {
        let mut form = Form::default();
        for (name, value) in SHIPPING {
            form.insert(name, input(value, !value.is_empty()));
        }
        for (name, _) in BILLING {
            form.insert(name, input("", false));
        }
        form.insert(GUEST_EMAIL_FIELD, input("buyer@example.com", false));
        form.insert(
            CSRF_FIELD,
            Field {
                value: CSRF_TOKEN.to_string(),
                required: false,
                kind: FieldKind::Hidden,
            },
        );

        let mut document = Document {
            location: "https://shop.test/orders/checkout/".to_string(),
            submit_button: Some(Control::enabled(labels::PLACE_ORDER)),
            same_address: true,
            billing_hidden: true,
            form,
            cart: vec![
                line("Harbour at Dusk", Some("HAD-001"), "450.00", "1"),
                line("Tide Study No. 3", None, "120.00", "2"),
            ],
            ..Document::default()
        };
        document
            .meta
            .insert(META_PUBLISHABLE_KEY.to_string(), PUBLISHABLE_KEY.to_string());
        document
    }

    /// Fill every billing input with a Cork address.
    pub fn fill_billing(document: &mut Document) {
        for (name, value) in BILLING {
            document.form.set_value(name, value);
        }
    }

    /// A payment-completion view reached with `query` (including `?`).
    #[must_use]
    pub fn resuming_document(query: &str) -> Document {
        let mut document = Document {
            location: format!("https://shop.test/orders/pay/{query}"),
            payment_mode_marker: true,
            payment_element: true,
            complete_payment_button: Some(Control::enabled(labels::COMPLETE_PAYMENT)),
            ..Document::default()
        };
        document
            .meta
            .insert(META_PUBLISHABLE_KEY.to_string(), PUBLISHABLE_KEY.to_string());
        document
    }
}
