//! Gallery Checkout - the checkout-to-payment handshake.
//!
//! A [`CheckoutFlowController`] owns one checkout page. At load it decides
//! whether the page is a fresh checkout form or a view completing an
//! in-progress payment, then sequences the order API and the hosted payment
//! widget in response to page events.
//!
//! # Modules
//!
//! - [`page`] - Snapshot of the rendered checkout page
//! - [`mode`] - Fresh/resuming detection at load
//! - [`session`] - Order payload collection from the form
//! - [`billing`] - "Same as shipping" toggle and shipping mirroring
//! - [`flow`] - Fresh and resuming state machines
//! - [`api`] - Order API port and its HTTP client
//! - [`widget`] / [`browser`] - Payment SDK and browser ports
//! - [`config`] - Environment and page configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod billing;
pub mod browser;
pub mod config;
pub mod controller;
pub mod error;
pub mod flow;
pub mod mode;
pub mod page;
pub mod session;
pub mod widget;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use api::{ApiConfig, ApiError, HttpOrderApi, OrderApi};
pub use browser::Browser;
pub use config::{CheckoutConfig, ConfigError, PublishableKey};
pub use controller::{CheckoutFlowController, PageEvent};
pub use error::{CheckoutError, Result};
pub use flow::{CheckoutState, ResumingState};
pub use mode::{CheckoutMode, Detection, detect};
pub use page::Document;
pub use widget::{ConfirmedIntent, PaymentWidget, WidgetError};
