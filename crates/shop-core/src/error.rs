//! # Shop Error Types
//!
//! Typed error handling for the nfc-cart engine.
//! Catalog, scan and checkout operations return `Result<T, ShopError>`.
//! Cart mutations never fail and do not use this type.

use std::time::Duration;
use thiserror::Error;

/// Core error type for catalog, scan and checkout operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShopError {
    /// Scanned product id is not in the catalog
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    /// Catalog lookup could not be completed
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Network/HTTP error communicating with the payment provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Provider answered with a success status but no usable invoice URL
    #[error("Invalid response from payment provider: {0}")]
    InvalidResponse(String),

    /// Provider rejected the request (non-2xx status)
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// The checkout call did not finish within the configured bound
    #[error("Checkout timed out after {after:?}")]
    Timeout { after: Duration },

    /// The caller dropped interest before the provider answered
    #[error("Checkout cancelled")]
    Cancelled,

    /// Checkout attempted on an empty cart
    #[error("Cart is empty")]
    EmptyCart,

    /// A checkout is already running for this session
    #[error("A checkout is already in progress")]
    CheckoutInFlight,

    /// Quantity rejected by a caller-side guard
    #[error("Invalid quantity {quantity} for {product_id}: must be between 1 and {}", crate::cart::MAX_LINE_QUANTITY)]
    InvalidQuantity { product_id: String, quantity: u32 },

    /// Line item id is not in the cart
    #[error("Item not in cart: {product_id}")]
    ItemNotInCart { product_id: String },

    /// Tag payload did not carry a product id
    #[error("Invalid tag: {0}")]
    InvalidTag(String),

    /// Price string or amount could not be used
    #[error("Invalid price: {message}")]
    InvalidPrice { message: String },

    /// No user is logged in
    #[error("No active session")]
    NoSession,

    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShopError {
    /// Returns true if the user may sensibly try the same action again.
    ///
    /// Nothing is retried automatically; this only drives the notification.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ShopError::NetworkError(_)
                | ShopError::InvalidResponse(_)
                | ShopError::ProviderError { .. }
                | ShopError::Timeout { .. }
                | ShopError::CatalogUnavailable(_)
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::ProductNotFound { .. } => 404,
            ShopError::CatalogUnavailable(_) => 503,
            ShopError::NetworkError(_) => 503,
            ShopError::InvalidResponse(_) => 502,
            ShopError::ProviderError { .. } => 502,
            ShopError::Timeout { .. } => 504,
            ShopError::Cancelled => 499,
            ShopError::EmptyCart => 400,
            ShopError::CheckoutInFlight => 409,
            ShopError::InvalidQuantity { .. } => 400,
            ShopError::ItemNotInCart { .. } => 404,
            ShopError::InvalidTag(_) => 400,
            ShopError::InvalidPrice { .. } => 400,
            ShopError::NoSession => 401,
            ShopError::Configuration(_) => 500,
            ShopError::Serialization(_) => 500,
            ShopError::Internal(_) => 500,
        }
    }

    /// Short text for a transient notification (toast) shown to the shopper
    pub fn user_message(&self) -> &'static str {
        match self {
            ShopError::ProductNotFound { .. } => "Product not found",
            ShopError::CatalogUnavailable(_) => "Failed to fetch product",
            ShopError::NetworkError(_)
            | ShopError::InvalidResponse(_)
            | ShopError::ProviderError { .. }
            | ShopError::Timeout { .. } => "Checkout failed, please try again",
            ShopError::Cancelled => "Checkout cancelled",
            ShopError::EmptyCart => "Cart is empty",
            ShopError::CheckoutInFlight => "Checkout already in progress",
            ShopError::InvalidQuantity { .. } => "Quantity must be between 1 and 999",
            ShopError::ItemNotInCart { .. } => "Item is no longer in the cart",
            ShopError::InvalidTag(_) => "Unrecognized NFC tag",
            ShopError::InvalidPrice { .. } => "Product has an invalid price",
            ShopError::NoSession => "Please log in first",
            ShopError::Configuration(_)
            | ShopError::Serialization(_)
            | ShopError::Internal(_) => "Something went wrong",
        }
    }
}

/// Result type alias for shop operations
pub type ShopResult<T> = Result<T, ShopError>;
