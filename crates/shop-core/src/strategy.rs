//! # Payment Strategy Trait
//!
//! Strategy pattern trait for invoicing providers.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          PaymentStrategy (trait)            │
//! │  ├── create_invoice()                       │
//! │  └── provider_name()                        │
//! └─────────────────────────────────────────────┘
//!                       ▲
//!          ┌────────────┴────────────┐
//!  ┌───────┴────────┐       ┌────────┴────────┐
//!  │ XenditInvoice  │       │  test doubles   │
//!  │   Strategy     │       │                 │
//!  └────────────────┘       └─────────────────┘
//! ```

use crate::checkout::{CheckoutRequest, InvoiceSession};
use crate::error::ShopResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Core trait for payment provider implementations.
#[async_trait]
pub trait PaymentStrategy: Send + Sync {
    /// Create a hosted invoice and return where to send the payer.
    ///
    /// Implementations issue exactly one request and never retry. A success
    /// status without a usable invoice URL is `ShopError::InvalidResponse`.
    async fn create_invoice(&self, request: &CheckoutRequest) -> ShopResult<InvoiceSession>;

    /// Get the provider name (for logging and routing).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a boxed payment strategy (dynamic dispatch)
pub type BoxedPaymentStrategy = Arc<dyn PaymentStrategy>;
