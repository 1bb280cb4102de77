//! Checkout configuration.
//!
//! In the browser the controller is configured from the page itself (the
//! publishable key meta tag, the page origin). Tools running outside the
//! browser load the same settings from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CHECKOUT_API_BASE_URL` - Base URL of the shop backend (e.g. `https://shop.example`)
//!
//! ## Optional
//! - `CHECKOUT_TIMEOUT_SECS` - Per-call timeout for API calls and mounting the payment form (default: 30, must be positive)
//! - `CHECKOUT_SUCCESS_PATH` - Success page template (default: `/orders/order/{order_id}/success/`)
//! - `CHECKOUT_FALLBACK_PATH` - Destination when a resumed payment has no order id (default: `/orders/`)

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::api::ApiConfig;

/// Placeholder for the order id in path templates.
pub const ORDER_ID_PLACEHOLDER: &str = "{order_id}";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SUCCESS_PATH: &str = "/orders/order/{order_id}/success/";
const DEFAULT_FALLBACK_PATH: &str = "/orders/";

/// Prefixes of payment SDK keys that must never be rendered into a page.
const SERVER_KEY_PREFIXES: &[&str] = &["sk_", "rk_"];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Payment SDK publishable key not found")]
    MissingPublishableKey,
    #[error("Insecure publishable key: {0}")]
    InsecureKey(String),
}

/// The payment SDK's publishable key as read from the page.
///
/// Publishable keys are meant to be public, so this is a plain string; the
/// check is that the page never ships a server-side key instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishableKey(String);

impl PublishableKey {
    /// Validate a key read from the page's meta tag.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingPublishableKey`] for an absent or blank
    /// key, and [`ConfigError::InsecureKey`] for a secret or restricted key.
    /// The rest of the key is provider-issued and not inspected.
    pub fn parse(raw: Option<&str>) -> Result<Self, ConfigError> {
        let key = raw
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingPublishableKey)?;

        if let Some(prefix) = SERVER_KEY_PREFIXES.iter().find(|p| key.starts_with(**p)) {
            return Err(ConfigError::InsecureKey(format!(
                "a server-side key ({prefix}...) is exposed in the page"
            )));
        }

        Ok(Self(key.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Checkout controller configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Order and payment API endpoints
    pub api: ApiConfig,
    /// Success page path template containing `{order_id}`
    pub success_path: String,
    /// Destination after a resumed payment succeeds without a known order id
    pub fallback_path: String,
    /// Upper bound on every API call and on mounting the payment form.
    /// Payment confirmation is not bounded: it waits on the buyer.
    pub timeout: Duration,
}

impl CheckoutConfig {
    /// Configuration with default paths and timeout for a backend at `base_url`.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            api: ApiConfig::new(base_url),
            success_path: DEFAULT_SUCCESS_PATH.to_string(),
            fallback_path: DEFAULT_FALLBACK_PATH.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = Url::parse(&get_required_env("CHECKOUT_API_BASE_URL")?).map_err(|e| {
            ConfigError::InvalidEnvVar("CHECKOUT_API_BASE_URL".to_string(), e.to_string())
        })?;
        let timeout = parse_timeout(
            "CHECKOUT_TIMEOUT_SECS",
            &get_env_or_default("CHECKOUT_TIMEOUT_SECS", "30"),
        )?;
        let success_path = get_env_or_default("CHECKOUT_SUCCESS_PATH", DEFAULT_SUCCESS_PATH);
        validate_template("CHECKOUT_SUCCESS_PATH", &success_path)?;

        Ok(Self {
            api: ApiConfig::new(base_url),
            success_path,
            fallback_path: get_env_or_default("CHECKOUT_FALLBACK_PATH", DEFAULT_FALLBACK_PATH),
            timeout,
        })
    }

    /// Success page path for `order_id`.
    #[must_use]
    pub fn success_path_for(&self, order_id: impl std::fmt::Display) -> String {
        self.success_path
            .replace(ORDER_ID_PLACEHOLDER, &order_id.to_string())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a timeout in whole seconds. Zero would expire every call at once.
fn parse_timeout(var_name: &str, raw: &str) -> Result<Duration, ConfigError> {
    let secs = raw
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must be at least 1 second".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Ensure a path template can carry the order id.
fn validate_template(var_name: &str, template: &str) -> Result<(), ConfigError> {
    if !template.starts_with('/') || !template.contains(ORDER_ID_PLACEHOLDER) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("must be an absolute path containing {ORDER_ID_PLACEHOLDER}"),
        ));
    }
    Ok(())
}
