//! # shop-xendit
//!
//! Xendit invoice strategy for nfc-cart-rs.
//!
//! **XenditInvoiceStrategy** creates one hosted invoice per checkout via
//! `POST /v2/invoices` and returns the `invoice_url` to redirect the payer to.
//! Requests are authenticated with HTTP Basic auth (secret key as username,
//! empty password) and are never retried.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shop_xendit::XenditInvoiceStrategy;
//! use shop_core::CheckoutCoordinator;
//! use std::sync::Arc;
//!
//! // Create strategy from environment
//! let strategy = XenditInvoiceStrategy::from_env()?;
//! let coordinator = CheckoutCoordinator::new(Arc::new(strategy));
//!
//! let result = coordinator.checkout(&cart.snapshot(), Some("ana@example.com")).await;
//!
//! // Redirect user to result.redirect_url()
//! ```

pub mod config;
pub mod invoice;

// Re-exports
pub use config::{checkout_timeout_from_env, parse_timeout_secs, XenditConfig};
pub use invoice::XenditInvoiceStrategy;
