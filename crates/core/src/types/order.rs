//! Order creation wire types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::address::Address;
use super::cart::CartItem;
use super::email::Email;
use super::id::OrderId;
use super::status::OrderStatus;

/// Body of the order-creation request.
///
/// `billing_address` and `guest_email` are omitted from the JSON entirely
/// when absent; a missing guest email tells the backend the buyer is signed
/// in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub items: Vec<CartItem>,
    pub shipping_address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_email: Option<Email>,
}

/// The order as echoed back by the order API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResult {
    pub id: OrderId,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub total: Option<Decimal>,
}
