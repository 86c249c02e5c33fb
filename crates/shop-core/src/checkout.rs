//! # Checkout
//!
//! Turns a cart snapshot into one invoice request and resolves the outcome.
//!
//! The coordinator is stateless with respect to the cart: it reads a
//! snapshot, never mutates the cart, and never retries. Keeping a second
//! checkout from starting while one is in flight is the caller's job.

use crate::cart::CartSnapshot;
use crate::error::{ShopError, ShopResult};
use crate::product::Price;
use crate::strategy::BoxedPaymentStrategy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Default bound on a single checkout call
pub const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default prefix for invoice external ids
pub const DEFAULT_EXTERNAL_ID_PREFIX: &str = "nfc-shop";

/// A single invoice request. Built once per attempt and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Unique per attempt; the provider uses it for idempotency
    pub external_id: String,

    /// Cart total
    pub amount: Price,

    /// Payer email; omitted from the wire when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer_email: Option<String>,

    /// `"name x qty"` per line item, comma-separated
    pub description: String,

    pub created_at: DateTime<Utc>,
}

impl CheckoutRequest {
    /// Build a request for `cart` with a freshly generated external id
    pub fn from_snapshot(cart: &CartSnapshot, payer_email: Option<&str>, id_prefix: &str) -> Self {
        Self {
            external_id: generate_external_id(id_prefix),
            amount: cart.total(),
            payer_email: payer_email.map(str::to_string),
            description: cart.description(),
            created_at: Utc::now(),
        }
    }
}

/// `<prefix>-<unix millis>-<8 hex chars>`.
///
/// The random suffix keeps two attempts in the same millisecond apart.
pub fn generate_external_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        prefix,
        Utc::now().timestamp_millis(),
        &suffix[..8]
    )
}

/// An invoice created by a payment provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceSession {
    /// Provider's invoice ID, if returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,

    /// Our external id for this attempt
    pub external_id: String,

    /// Provider name (e.g., "xendit")
    pub provider: String,

    /// URL to redirect the payer to
    pub invoice_url: String,

    /// When the invoice expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl InvoiceSession {
    pub fn new(
        external_id: impl Into<String>,
        provider: impl Into<String>,
        invoice_url: impl Into<String>,
    ) -> Self {
        Self {
            invoice_id: None,
            external_id: external_id.into(),
            provider: provider.into(),
            invoice_url: invoice_url.into(),
            expires_at: None,
        }
    }
}

/// Outcome of one checkout attempt
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutResult {
    /// Send the payer to `redirect_url`
    Success { redirect_url: String },
    /// The attempt failed; the cart is unchanged
    Failure(ShopError),
}

impl CheckoutResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CheckoutResult::Success { .. })
    }

    pub fn redirect_url(&self) -> Option<&str> {
        match self {
            CheckoutResult::Success { redirect_url } => Some(redirect_url),
            CheckoutResult::Failure(_) => None,
        }
    }

    pub fn into_result(self) -> ShopResult<String> {
        match self {
            CheckoutResult::Success { redirect_url } => Ok(redirect_url),
            CheckoutResult::Failure(e) => Err(e),
        }
    }
}

impl From<ShopResult<InvoiceSession>> for CheckoutResult {
    fn from(result: ShopResult<InvoiceSession>) -> Self {
        match result {
            Ok(session) => CheckoutResult::Success {
                redirect_url: session.invoice_url,
            },
            Err(e) => CheckoutResult::Failure(e),
        }
    }
}

/// Drives a cart snapshot through one invoice request
#[derive(Clone)]
pub struct CheckoutCoordinator {
    strategy: BoxedPaymentStrategy,
    timeout: Duration,
    external_id_prefix: String,
}

impl CheckoutCoordinator {
    pub fn new(strategy: BoxedPaymentStrategy) -> Self {
        Self {
            strategy,
            timeout: DEFAULT_CHECKOUT_TIMEOUT,
            external_id_prefix: DEFAULT_EXTERNAL_ID_PREFIX.to_string(),
        }
    }

    /// Builder: bound on the provider call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder: external id prefix
    pub fn with_external_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.external_id_prefix = prefix.into();
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.strategy.provider_name()
    }

    /// Build the request this coordinator would send for `cart`
    pub fn build_request(&self, cart: &CartSnapshot, payer_email: Option<&str>) -> CheckoutRequest {
        CheckoutRequest::from_snapshot(cart, payer_email, &self.external_id_prefix)
    }

    /// Check out `cart` with exactly one provider call.
    ///
    /// An empty cart (or one totalling zero) fails with `EmptyCart` before
    /// anything is sent.
    #[instrument(skip(self, cart, payer_email), fields(items = cart.items.len(), provider = self.strategy.provider_name()))]
    pub async fn checkout(&self, cart: &CartSnapshot, payer_email: Option<&str>) -> CheckoutResult {
        if !cart.checkout_enabled() {
            return CheckoutResult::Failure(ShopError::EmptyCart);
        }

        let request = self.build_request(cart, payer_email);
        info!(
            "Creating invoice: external_id={}, amount={}, items={}",
            request.external_id,
            request.amount.display(),
            cart.item_count()
        );

        let outcome = match tokio::time::timeout(self.timeout, self.strategy.create_invoice(&request)).await {
            Ok(result) => result,
            Err(_) => Err(ShopError::Timeout {
                after: self.timeout,
            }),
        };

        match &outcome {
            Ok(session) => info!(
                "Invoice ready: external_id={}, url={}",
                session.external_id, session.invoice_url
            ),
            Err(e) => error!("Invoice creation failed for {}: {}", request.external_id, e),
        }

        outcome.into()
    }

    /// Like `checkout`, but gives up as soon as `cancel` completes.
    ///
    /// The in-flight request is dropped and any late response is discarded.
    pub async fn checkout_cancellable<F>(
        &self,
        cart: &CartSnapshot,
        payer_email: Option<&str>,
        cancel: F,
    ) -> CheckoutResult
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                info!("Checkout cancelled by caller");
                CheckoutResult::Failure(ShopError::Cancelled)
            }
            result = self.checkout(cart, payer_email) => result,
        }
    }
}
