//! End-to-end checkout flows over HTTP against the fake shop.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use gallery_checkout::flow::{CheckoutState, ResumingState};
use gallery_checkout::testing::{RecordingBrowser, ScriptedWidget, fixtures};
use gallery_checkout::{
    ApiError, CheckoutConfig, CheckoutError, CheckoutFlowController, CheckoutMode, Document,
    HttpOrderApi, PageEvent,
};
use gallery_checkout_integration_tests::{FakeShop, ShopScript};
use serde_json::json;

type Controller = CheckoutFlowController<HttpOrderApi, ScriptedWidget, RecordingBrowser>;

async fn controller(shop: &FakeShop, document: Document) -> Controller {
    let config = shop.config().unwrap();
    let api = HttpOrderApi::new(config.api.clone()).unwrap();
    CheckoutFlowController::initialize(
        config,
        document,
        api,
        ScriptedWidget::default(),
        RecordingBrowser::default(),
    )
    .await
    .unwrap_or_else(|e| panic!("initialization failed: {e}"))
}

fn submit_label(c: &Controller) -> (String, bool) {
    let button = c.document().submit_button.as_ref().unwrap();
    (button.label.clone(), !button.disabled)
}

#[tokio::test]
async fn test_order_42_mounts_cs_test_1_and_succeeds() {
    let shop = FakeShop::spawn(ShopScript::new(42, "cs_test_1")).await.unwrap();
    let mut c = controller(&shop, fixtures::checkout_document()).await;

    c.dispatch(PageEvent::SubmitOrder).await.unwrap();
    assert_eq!(c.widget().mounted, ["cs_test_1"]);
    assert_eq!(submit_label(&c), ("Complete Payment".to_string(), true));

    let requests = shop.requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, "/orders/create/");
    assert_eq!(requests[0].csrf.as_deref(), Some(fixtures::CSRF_TOKEN));
    assert_eq!(requests[1].path, "/orders/start-payment/42/");
    assert_eq!(requests[1].csrf.as_deref(), Some(fixtures::CSRF_TOKEN));
    let key = requests[1].idempotency_key.as_deref().unwrap();
    assert!(uuid::Uuid::parse_str(key).is_ok());

    let Some(CheckoutState::Paying(handle)) = c.fresh_state() else {
        panic!("expected paying state");
    };
    assert_eq!(handle.payment_id.map(|p| p.as_i64()), Some(420));

    c.dispatch(PageEvent::SubmitOrder).await.unwrap();
    let destination = &c.browser().navigations[0];
    assert!(destination.contains("42"), "{destination}");
    assert_eq!(shop.requests().await.len(), 2);
}

#[tokio::test]
async fn test_order_payload_matches_backend_contract() {
    let shop = FakeShop::spawn(ShopScript::new(5, "cs_test_5")).await.unwrap();
    let mut c = controller(&shop, fixtures::checkout_document()).await;
    c.dispatch(PageEvent::SubmitOrder).await.unwrap();

    let requests = shop.requests().await;
    let body = &requests[0].body;
    assert_eq!(body["guest_email"], "buyer@example.com");
    assert_eq!(body["shipping_address"]["address_type"], "shipping");
    assert_eq!(body["shipping_address"]["postal_code"], "D02 XY45");
    assert!(body["shipping_address"].get("line2").is_none());
    assert!(body.get("billing_address").is_none());
    assert_eq!(body["items"][0]["product_title"], "Harbour at Dusk");
    assert_eq!(body["items"][0]["product_sku"], "HAD-001");
    assert_eq!(body["items"][0]["unit_price"], "450.00");
    assert_eq!(body["items"][1]["quantity"], 2);
    assert!(body["items"][1].get("product_sku").is_none());
}

#[tokio::test]
async fn test_rejected_order_restores_control_and_skips_payment() {
    let script = ShopScript::new(42, "cs_test_1").rejecting_orders(
        StatusCode::BAD_REQUEST,
        json!({"detail": "Your cart is empty"}),
    );
    let shop = FakeShop::spawn(script).await.unwrap();
    let mut c = controller(&shop, fixtures::checkout_document()).await;

    let err = c.dispatch(PageEvent::SubmitOrder).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Api(ApiError::Api { status: 400, .. })
    ));
    assert_eq!(submit_label(&c), ("Place Order".to_string(), true));
    assert_eq!(shop.requests().await.len(), 1);
    assert!(c.widget().mounted.is_empty());
    assert_eq!(
        c.browser().alerts,
        ["There was an error processing your order: Your cart is empty. Please try again."]
    );
}

#[tokio::test]
async fn test_field_errors_are_flattened_into_alert() {
    let script = ShopScript::new(42, "cs_test_1").rejecting_orders(
        StatusCode::BAD_REQUEST,
        json!({"shipping_address": {"postal_code": ["This field is required."]}}),
    );
    let shop = FakeShop::spawn(script).await.unwrap();
    let mut c = controller(&shop, fixtures::checkout_document()).await;

    assert!(c.dispatch(PageEvent::SubmitOrder).await.is_err());
    assert!(c.browser().alerts[0].contains("This field is required."));
}

#[tokio::test]
async fn test_rejected_payment_start_returns_to_editing() {
    let script = ShopScript::new(42, "cs_test_1")
        .rejecting_payments(StatusCode::INTERNAL_SERVER_ERROR, json!({}));
    let shop = FakeShop::spawn(script).await.unwrap();
    let mut c = controller(&shop, fixtures::checkout_document()).await;

    assert!(c.dispatch(PageEvent::SubmitOrder).await.is_err());
    assert!(matches!(c.fresh_state(), Some(CheckoutState::Editing)));
    assert_eq!(submit_label(&c), ("Place Order".to_string(), true));
}

#[tokio::test]
async fn test_unreachable_backend_is_recoverable() {
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let config = CheckoutConfig::new(url::Url::parse(&format!("http://{addr}/")).unwrap());

    let api = HttpOrderApi::new(config.api.clone()).unwrap();
    let mut c = CheckoutFlowController::initialize(
        config,
        fixtures::checkout_document(),
        api,
        ScriptedWidget::default(),
        RecordingBrowser::default(),
    )
    .await
    .unwrap_or_else(|e| panic!("initialization failed: {e}"));

    let err = c.dispatch(PageEvent::SubmitOrder).await.unwrap_err();
    assert!(err.is_recoverable());
    assert!(matches!(c.fresh_state(), Some(CheckoutState::Editing)));
    assert_eq!(c.browser().alerts.len(), 1);
}

#[tokio::test]
async fn test_resuming_without_secret_makes_no_calls() {
    let shop = FakeShop::spawn(ShopScript::new(42, "cs_test_1")).await.unwrap();
    let mut c = controller(&shop, fixtures::resuming_document("?order_id=42")).await;

    assert_eq!(c.mode(), CheckoutMode::Resuming);
    assert!(matches!(c.resuming_state(), Some(ResumingState::Inert)));
    c.dispatch(PageEvent::CompletePayment).await.unwrap();

    assert!(c.widget().mounted.is_empty());
    assert!(c.widget().confirms.is_empty());
    assert!(shop.requests().await.is_empty());
}

#[tokio::test]
async fn test_resuming_with_secret_confirms_without_backend() {
    let shop = FakeShop::spawn(ShopScript::new(42, "unused")).await.unwrap();
    let mut c = controller(
        &shop,
        fixtures::resuming_document("?payment_intent_client_secret=cs_test_1&order_id=42"),
    )
    .await;

    c.dispatch(PageEvent::CompletePayment).await.unwrap();
    assert_eq!(c.widget().mounted, ["cs_test_1"]);
    assert_eq!(c.widget().submits, 0);
    assert_eq!(c.browser().navigations, ["/orders/order/42/success/"]);
    assert!(shop.requests().await.is_empty());
}
