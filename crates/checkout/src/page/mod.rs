//! Model of the rendered checkout page.
//!
//! The controller never touches a real DOM. It reads and mutates a
//! [`Document`] snapshot holding exactly the parts of the markup the checkout
//! handshake cares about: meta tags, the page URL, structural markers, form
//! inputs, rendered cart lines and the two action controls. A browser binding
//! keeps the snapshot and the live page in sync.

mod form;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

pub use form::{Field, FieldKind, Form};

/// Meta tag carrying the payment SDK publishable key.
pub const META_PUBLISHABLE_KEY: &str = "stripe-publishable-key";

/// Hidden input carrying the anti-forgery token.
pub const CSRF_FIELD: &str = "csrfmiddlewaretoken";

/// Optional guest email input (absent for signed-in buyers).
pub const GUEST_EMAIL_FIELD: &str = "guest_email";

/// Query parameter holding the payment intent client secret when resuming.
pub const QUERY_CLIENT_SECRET: &str = "payment_intent_client_secret";

/// Query parameter holding the order id when resuming.
pub const QUERY_ORDER_ID: &str = "order_id";

/// A button-like control: its visible label and whether it accepts clicks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    pub label: String,
    #[serde(default)]
    pub disabled: bool,
}

impl Control {
    /// An enabled control with `label`.
    #[must_use]
    pub fn enabled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            disabled: false,
        }
    }
}

/// Data attributes of one rendered cart line.
///
/// Values are kept as raw text; validation happens when the order payload is
/// collected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartLineMarkup {
    pub title: Option<String>,
    pub sku: Option<String>,
    pub price: Option<String>,
    pub quantity: Option<String>,
}

/// Snapshot of the checkout page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    /// Absolute page URL including the query string.
    pub location: String,
    /// `<meta name=... content=...>` pairs.
    pub meta: BTreeMap<String, String>,
    /// A `section[data-payment-mode="true"]` marker is rendered.
    pub payment_mode_marker: bool,
    /// A `#payment-element` mount point is rendered.
    pub payment_element: bool,
    /// The resuming view's `#complete-payment-btn`, when rendered.
    pub complete_payment_button: Option<Control>,
    /// The checkout form's submit control, when rendered.
    pub submit_button: Option<Control>,
    /// The "same as shipping" checkbox state.
    pub same_address: bool,
    /// Whether the billing section is hidden.
    pub billing_hidden: bool,
    /// Checkout form inputs.
    pub form: Form,
    /// Cart lines rendered next to the form.
    pub cart: Vec<CartLineMarkup>,
}

impl Document {
    /// Content of the meta tag `name`, if rendered.
    #[must_use]
    pub fn meta(&self, name: &str) -> Option<&str> {
        self.meta.get(name).map(String::as_str)
    }

    /// The page URL, if `location` is a valid absolute URL.
    #[must_use]
    pub fn url(&self) -> Option<Url> {
        Url::parse(&self.location).ok()
    }

    /// First value of query parameter `name`, percent-decoded.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url()?
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Resolve `path` against the page URL.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<Url> {
        self.url()?.join(path).ok()
    }
}
