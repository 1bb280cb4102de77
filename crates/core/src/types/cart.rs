//! Cart line items submitted with an order.

use serde::{Deserialize, Serialize};

use super::price::{PriceError, UnitPrice};

/// Reasons a rendered cart line cannot become a [`CartItem`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartItemError {
    /// The line has no title (or only whitespace).
    #[error("cart line has no title")]
    MissingTitle,
    /// The line's price is missing, malformed or not positive.
    #[error("cart line price rejected: {0}")]
    Price(#[from] PriceError),
    /// The line asks for zero units.
    #[error("cart line quantity must be at least 1")]
    ZeroQuantity,
}

/// One purchasable line of the order.
///
/// Field names follow the order API (`product_title`, `product_sku`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(rename = "product_title")]
    pub title: String,
    #[serde(
        rename = "product_sku",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sku: Option<String>,
    pub unit_price: UnitPrice,
    pub quantity: u32,
}

impl CartItem {
    /// Build a cart item from the raw attribute values of a rendered cart line.
    ///
    /// A missing or unparseable quantity counts as one unit; an explicit zero
    /// is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank title, a price that is not strictly
    /// positive, or a zero quantity.
    pub fn from_markup(
        title: Option<&str>,
        sku: Option<&str>,
        price: Option<&str>,
        quantity: Option<&str>,
    ) -> Result<Self, CartItemError> {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(CartItemError::MissingTitle)?;
        let unit_price = UnitPrice::parse(price.unwrap_or_default())?;
        let quantity = quantity
            .and_then(|q| q.trim().parse::<u32>().ok())
            .unwrap_or(1);
        if quantity == 0 {
            return Err(CartItemError::ZeroQuantity);
        }

        Ok(Self {
            title: title.to_owned(),
            sku: sku
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            unit_price,
            quantity,
        })
    }
}
