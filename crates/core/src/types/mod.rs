//! Core types for the gallery checkout.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod cart;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod status;

pub use address::{Address, AddressError, AddressKind};
pub use cart::{CartItem, CartItemError};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{OrderRequest, OrderResult};
pub use price::{PriceError, UnitPrice};
pub use status::*;
