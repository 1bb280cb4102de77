//! `HttpOrderApi` against the fake shop.

#![allow(clippy::unwrap_used)]

use gallery_checkout::api::CsrfToken;
use gallery_checkout::session::CheckoutSession;
use gallery_checkout::testing::fixtures;
use gallery_checkout::{ApiError, HttpOrderApi, OrderApi};
use gallery_checkout_core::OrderId;
use gallery_checkout_integration_tests::{FakeShop, ShopScript};

#[tokio::test]
async fn test_create_order_decodes_response() {
    let shop = FakeShop::spawn(ShopScript::new(17, "cs_test_17")).await.unwrap();
    let api = HttpOrderApi::new(shop.config().unwrap().api).unwrap();
    let request = CheckoutSession::collect(&fixtures::checkout_document())
        .unwrap()
        .order_request();

    let order = api.create_order(&request, None).await.unwrap();
    assert_eq!(order.id, OrderId::new(17));
    assert_eq!(order.order_number.as_deref(), Some("GAL-00017"));
    assert_eq!(order.total.unwrap().to_string(), "1020.00");

    let recorded = shop.requests().await;
    assert!(recorded[0].csrf.is_none());
}

#[tokio::test]
async fn test_start_payment_sends_headers() {
    let shop = FakeShop::spawn(ShopScript::new(17, "cs_test_17")).await.unwrap();
    let api = HttpOrderApi::new(shop.config().unwrap().api).unwrap();
    let csrf = CsrfToken::new("token-abc");

    let started = api
        .start_payment(OrderId::new(17), Some(&csrf), "key-1")
        .await
        .unwrap();
    assert_eq!(started.client_secret.expose(), "cs_test_17");

    let recorded = shop.requests().await;
    assert_eq!(recorded[0].csrf.as_deref(), Some("token-abc"));
    assert_eq!(recorded[0].idempotency_key.as_deref(), Some("key-1"));
}

#[tokio::test]
async fn test_blank_client_secret_is_a_parse_error() {
    let shop = FakeShop::spawn(ShopScript::new(17, "")).await.unwrap();
    let api = HttpOrderApi::new(shop.config().unwrap().api).unwrap();

    let err = api
        .start_payment(OrderId::new(17), None, "key-1")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
}
