//! Integration tests for Gallery Checkout.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p gallery-checkout-integration-tests
//! ```
//!
//! Tests drive the real `HttpOrderApi` against [`FakeShop`], an in-process
//! `axum` server bound to `127.0.0.1:0` that serves the order and
//! start-payment endpoints and records every request it receives.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use gallery_checkout::CheckoutConfig;
use gallery_checkout::api::{CSRF_HEADER, IDEMPOTENCY_HEADER};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use url::Url;

/// A request received by the fake shop.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub csrf: Option<String>,
    pub idempotency_key: Option<String>,
    /// JSON body, `Value::Null` when empty.
    pub body: Value,
}

/// How the fake shop answers.
#[derive(Debug, Clone)]
pub struct ShopScript {
    pub order_id: i64,
    pub client_secret: String,
    pub create_order_failure: Option<(StatusCode, Value)>,
    pub start_payment_failure: Option<(StatusCode, Value)>,
}

impl ShopScript {
    /// Accept every order as `order_id` and start intents with
    /// `client_secret`.
    #[must_use]
    pub fn new(order_id: i64, client_secret: &str) -> Self {
        Self {
            order_id,
            client_secret: client_secret.to_string(),
            create_order_failure: None,
            start_payment_failure: None,
        }
    }

    #[must_use]
    pub fn rejecting_orders(mut self, status: StatusCode, body: Value) -> Self {
        self.create_order_failure = Some((status, body));
        self
    }

    #[must_use]
    pub fn rejecting_payments(mut self, status: StatusCode, body: Value) -> Self {
        self.start_payment_failure = Some((status, body));
        self
    }
}

#[derive(Clone)]
struct ShopState {
    script: Arc<ShopScript>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ShopState {
    async fn record(&self, path: String, headers: &HeaderMap, body: Value) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.requests.lock().await.push(RecordedRequest {
            path,
            csrf: header(CSRF_HEADER),
            idempotency_key: header(IDEMPOTENCY_HEADER),
            body,
        });
    }
}

/// In-process shop backend.
///
/// The server task stops when the value is dropped.
pub struct FakeShop {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    server: JoinHandle<()>,
}

impl FakeShop {
    /// Bind to an ephemeral port and start serving `script`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn spawn(script: ShopScript) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = ShopState {
            script: Arc::new(script),
            requests: Arc::clone(&requests),
        };

        let app = Router::new()
            .route("/orders/create/", post(create_order))
            .route("/orders/start-payment/{order_id}/", post(start_payment))
            .with_state(state);

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Fake shop stopped");
            }
        });

        Ok(Self {
            addr,
            requests,
            server,
        })
    }

    /// Base URL of the running server.
    ///
    /// # Errors
    ///
    /// Never fails for a bound socket address; the `Result` mirrors
    /// [`Url::parse`].
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("http://{}/", self.addr))
    }

    /// Checkout configuration pointing at this server.
    ///
    /// # Errors
    ///
    /// See [`FakeShop::base_url`].
    pub fn config(&self) -> Result<CheckoutConfig, url::ParseError> {
        Ok(CheckoutConfig::new(self.base_url()?))
    }

    /// Requests received so far, in arrival order.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }
}

impl Drop for FakeShop {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn create_order(
    State(state): State<ShopState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state
        .record("/orders/create/".to_string(), &headers, body)
        .await;

    if let Some((status, body)) = state.script.create_order_failure.clone() {
        return (status, Json(body)).into_response();
    }
    let id = state.script.order_id;
    (
        StatusCode::CREATED,
        Json(json!({
            "id": id,
            "order_number": format!("GAL-{id:05}"),
            "status": "pending",
            "total": "1020.00",
        })),
    )
        .into_response()
}

async fn start_payment(
    State(state): State<ShopState>,
    Path(order_id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    state
        .record(
            format!("/orders/start-payment/{order_id}/"),
            &headers,
            Value::Null,
        )
        .await;

    if let Some((status, body)) = state.script.start_payment_failure.clone() {
        return (status, Json(body)).into_response();
    }
    Json(json!({
        "client_secret": state.script.client_secret,
        "payment_id": order_id * 10,
    }))
    .into_response()
}
