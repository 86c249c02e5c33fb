//! # shop-core
//!
//! Core types and traits for the nfc-cart self-checkout engine.
//!
//! This crate provides:
//! - `Price`, `Currency` and `Product` with exact minor-unit money
//! - `CartStore` and `CartHandle` for the session cart
//! - `Catalog` trait and `InMemoryCatalog` for product lookup
//! - `ScanHandler` and tag parsing for NFC scans
//! - `PaymentStrategy` trait and `CheckoutCoordinator` for invoicing
//! - `ShoppingSession`, transaction history and receipts
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{CheckoutCoordinator, Currency, ScanHandler, ShoppingSession, UserIdentity};
//!
//! let session = ShoppingSession::start(UserIdentity::new("uid-1"), Currency::IDR);
//!
//! // Each scan adds one unit
//! scanner.scan_payload(session.cart(), b"\x02enProdID: P1").await?;
//!
//! // One invoice request per checkout
//! let result = coordinator.checkout(&session.cart().snapshot(), session.payer_email()).await;
//!
//! // Redirect the payer to result.redirect_url()
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod discount;
pub mod error;
pub mod history;
pub mod product;
pub mod scan;
pub mod session;
pub mod strategy;

// Re-exports for convenience
pub use cart::{CartHandle, CartSnapshot, CartStore, LineItem, MAX_LINE_QUANTITY};
pub use catalog::{Catalog, InMemoryCatalog, ProductRecord, SharedCatalog};
pub use checkout::{
    generate_external_id, CheckoutCoordinator, CheckoutRequest, CheckoutResult, InvoiceSession,
    DEFAULT_CHECKOUT_TIMEOUT, DEFAULT_EXTERNAL_ID_PREFIX,
};
pub use discount::{parse_discounts, Discount};
pub use error::{ShopError, ShopResult};
pub use history::{history_from_user_record, parse_transaction_history, Receipt, Transaction};
pub use product::{parse_price, Currency, Price, Product};
pub use scan::{parse_tag_payload, parse_tag_text, ScanHandler, TagScan};
pub use session::{new_user_record, ShoppingSession, UserIdentity, UserProfile};
pub use strategy::{BoxedPaymentStrategy, PaymentStrategy};
