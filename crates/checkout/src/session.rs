//! Collecting the order payload from the checkout form.
//!
//! Collection is lenient about optional data and strict about required
//! data: partial billing addresses and malformed cart lines are dropped
//! without complaint, while missing shipping fields or an unusable guest
//! email stop the submission before any network call.

use gallery_checkout_core::{
    Address, AddressError, AddressKind, CartItem, Email, EmailError, OrderRequest,
};
use thiserror::Error;
use tracing::debug;

use crate::api::CsrfToken;
use crate::mode::CheckoutMode;
use crate::page::{CSRF_FIELD, Document, GUEST_EMAIL_FIELD};

/// Reasons the form cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("{0}")]
    Shipping(#[from] AddressError),

    #[error("invalid guest email: {0}")]
    GuestEmail(#[from] EmailError),
}

/// Checkout data read from the page at submission time.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub mode: CheckoutMode,
    pub same_address: bool,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub cart_items: Vec<CartItem>,
    /// Present only for guest checkout; absence means a signed-in buyer.
    pub guest_email: Option<Email>,
    pub csrf_token: Option<CsrfToken>,
}

impl CheckoutSession {
    /// Read the current form state.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Shipping`] when a required shipping field is
    /// blank, and [`SessionError::GuestEmail`] when a guest email was typed
    /// but is malformed.
    pub fn collect(document: &Document) -> Result<Self, SessionError> {
        let lookup = |name: &str| document.form.value(name);

        let shipping_address = Address::from_fields(AddressKind::Shipping, lookup)?;
        let billing_address = if document.same_address {
            None
        } else {
            Address::from_fields(AddressKind::Billing, lookup)
                .inspect_err(|e| debug!(reason = %e, "Dropping incomplete billing address"))
                .ok()
        };

        let guest_email = document
            .form
            .value(GUEST_EMAIL_FIELD)
            .filter(|v| !v.trim().is_empty())
            .map(Email::parse)
            .transpose()?;

        let csrf_token = document
            .form
            .value(CSRF_FIELD)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(CsrfToken::new);

        Ok(Self {
            mode: CheckoutMode::of(document),
            same_address: document.same_address,
            shipping_address,
            billing_address,
            cart_items: collect_cart(document),
            guest_email,
            csrf_token,
        })
    }

    /// The order-creation request body for this session.
    #[must_use]
    pub fn order_request(&self) -> OrderRequest {
        OrderRequest {
            items: self.cart_items.clone(),
            shipping_address: self.shipping_address.clone(),
            billing_address: self.billing_address.clone(),
            guest_email: self.guest_email.clone(),
        }
    }
}

/// Rendered cart lines that form valid items, in page order.
fn collect_cart(document: &Document) -> Vec<CartItem> {
    document
        .cart
        .iter()
        .enumerate()
        .filter_map(|(index, line)| {
            CartItem::from_markup(
                line.title.as_deref(),
                line.sku.as_deref(),
                line.price.as_deref(),
                line.quantity.as_deref(),
            )
            .inspect_err(|e| debug!(line = index, reason = %e, "Skipping cart line"))
            .ok()
        })
        .collect()
}
