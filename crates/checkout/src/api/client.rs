//! `reqwest` implementation of the order API.

use std::sync::Arc;

use gallery_checkout_core::{OrderId, OrderRequest, OrderResult};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{
    ApiConfig, ApiError, CSRF_HEADER, CsrfToken, IDEMPOTENCY_HEADER, OrderApi, StartPaymentBody,
    StartedPayment, error_message,
};

/// HTTP client for the shop's order API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct HttpOrderApi {
    inner: Arc<HttpOrderApiInner>,
}

struct HttpOrderApiInner {
    client: reqwest::Client,
    config: ApiConfig,
}

impl HttpOrderApi {
    /// Create a new order API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpOrderApiInner { client, config }),
        })
    }

    /// Endpoint configuration this client talks to.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Send a prepared POST and decode a JSON success body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &Url,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                url = %url,
                body = %body.chars().take(500).collect::<String>(),
                "Order API returned non-success status"
            );
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                url = %url,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse order API response"
            );
            ApiError::Parse(e.to_string())
        })
    }
}

/// Attach the anti-forgery header when the page rendered a token.
fn with_csrf(
    request: reqwest::RequestBuilder,
    csrf: Option<&CsrfToken>,
) -> Result<reqwest::RequestBuilder, ApiError> {
    match csrf {
        Some(token) => {
            let value =
                HeaderValue::from_str(token.expose()).map_err(|_| ApiError::Header(CSRF_HEADER))?;
            Ok(request.header(CSRF_HEADER, value))
        }
        None => Ok(request),
    }
}

impl OrderApi for HttpOrderApi {
    #[instrument(skip(self, order, csrf), fields(items = order.items.len()))]
    async fn create_order(
        &self,
        order: &OrderRequest,
        csrf: Option<&CsrfToken>,
    ) -> Result<OrderResult, ApiError> {
        let url = self.inner.config.create_order_url()?;
        let request = with_csrf(self.inner.client.post(url.clone()), csrf)?.json(order);

        let result: OrderResult = self.send(request, &url).await?;
        debug!(order_id = %result.id, "Order created");
        Ok(result)
    }

    #[instrument(skip(self, csrf, idempotency_key), fields(order_id = %order_id))]
    async fn start_payment(
        &self,
        order_id: OrderId,
        csrf: Option<&CsrfToken>,
        idempotency_key: &str,
    ) -> Result<StartedPayment, ApiError> {
        let url = self.inner.config.start_payment_url(order_id)?;
        let key = HeaderValue::from_str(idempotency_key)
            .map_err(|_| ApiError::Header(IDEMPOTENCY_HEADER))?;
        let request =
            with_csrf(self.inner.client.post(url.clone()), csrf)?.header(IDEMPOTENCY_HEADER, key);

        let body: StartPaymentBody = self.send(request, &url).await?;
        let started = StartedPayment::try_from(body)?;
        debug!(payment_id = ?started.payment_id, "Payment intent started");
        Ok(started)
    }
}
