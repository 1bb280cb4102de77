//! Gallery Checkout Core - Shared domain types.
//!
//! This crate provides the types exchanged between the checkout controller
//! and the shop's order and payment API:
//! - `checkout` - Checkout flow controller (page model, state machines, API client)
//! - `cli` - Command-line tools for inspecting pages and placing orders
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients, no DOM access. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, prices, addresses, cart
//!   items, order wire types and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
