//! # Xendit Configuration
//!
//! Configuration management for the Xendit integration.
//! All secrets are loaded from environment variables.

use shop_core::{ShopError, ShopResult, DEFAULT_CHECKOUT_TIMEOUT};
use std::env;
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "https://api.xendit.co";
const TEST_KEY_PREFIX: &str = "xnd_development_";
const LIVE_KEY_PREFIX: &str = "xnd_production_";

/// Xendit API configuration
#[derive(Debug, Clone)]
pub struct XenditConfig {
    /// Secret API key (xnd_development_... or xnd_production_...)
    pub secret_key: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// Prepended to every invoice description, if set
    pub description_prefix: Option<String>,

    /// HTTP client timeout
    pub timeout: Duration,
}

impl XenditConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `XENDIT_SECRET_KEY`
    ///
    /// Optional:
    /// - `XENDIT_API_BASE_URL`
    /// - `XENDIT_DESCRIPTION_PREFIX`
    /// - `CHECKOUT_TIMEOUT_SECS`
    pub fn from_env() -> ShopResult<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let secret_key = env::var("XENDIT_SECRET_KEY")
            .map_err(|_| ShopError::Configuration("XENDIT_SECRET_KEY not set".to_string()))?;
        validate_secret_key(&secret_key)?;

        let mut config = Self::new(secret_key);

        if let Ok(url) = env::var("XENDIT_API_BASE_URL") {
            config = config.with_api_base_url(url);
        }

        if let Ok(prefix) = env::var("XENDIT_DESCRIPTION_PREFIX") {
            config = config.with_description_prefix(prefix);
        }

        Ok(config.with_timeout(checkout_timeout_from_env()?))
    }

    /// Create config with explicit values (for testing)
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            description_prefix: None,
            timeout: DEFAULT_CHECKOUT_TIMEOUT,
        }
    }

    /// Check if using development keys
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.starts_with(TEST_KEY_PREFIX)
    }

    /// Check if using production keys
    pub fn is_live_mode(&self) -> bool {
        self.secret_key.starts_with(LIVE_KEY_PREFIX)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder: description prefix. Blank means none.
    pub fn with_description_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.description_prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    /// Builder: HTTP client timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Invoice description for a cart description
    pub fn invoice_description(&self, cart_description: &str) -> String {
        match &self.description_prefix {
            Some(prefix) => format!("{}{}", prefix, cart_description),
            None => cart_description.to_string(),
        }
    }
}

/// Checkout timeout from `CHECKOUT_TIMEOUT_SECS`, or the default when unset
pub fn checkout_timeout_from_env() -> ShopResult<Duration> {
    match env::var("CHECKOUT_TIMEOUT_SECS") {
        Ok(raw) => parse_timeout_secs(&raw),
        Err(_) => Ok(DEFAULT_CHECKOUT_TIMEOUT),
    }
}

/// Parse a whole, positive number of seconds
pub fn parse_timeout_secs(raw: &str) -> ShopResult<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ShopError::Configuration(format!(
            "CHECKOUT_TIMEOUT_SECS must be a positive number of seconds: {:?}",
            raw
        ))),
    }
}

fn validate_secret_key(key: &str) -> ShopResult<()> {
    if key.starts_with(TEST_KEY_PREFIX) || key.starts_with(LIVE_KEY_PREFIX) {
        Ok(())
    } else {
        Err(ShopError::Configuration(format!(
            "XENDIT_SECRET_KEY must start with {} or {}",
            TEST_KEY_PREFIX, LIVE_KEY_PREFIX
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_modes() {
        let config = XenditConfig::new("xnd_development_abc123");
        assert!(config.is_test_mode());
        assert!(!config.is_live_mode());

        let config = XenditConfig::new("xnd_production_abc123");
        assert!(!config.is_test_mode());
        assert!(config.is_live_mode());
    }

    #[test]
    fn test_key_validation() {
        assert!(validate_secret_key("xnd_development_abc").is_ok());
        assert!(validate_secret_key("xnd_production_abc").is_ok());
        assert!(matches!(
            validate_secret_key("sk_test_abc"),
            Err(ShopError::Configuration(_))
        ));
    }

    #[test]
    fn test_builders() {
        let config = XenditConfig::new("xnd_development_abc")
            .with_api_base_url("http://127.0.0.1:9999/")
            .with_timeout(Duration::from_secs(5))
            .with_description_prefix("Shopping Cart: ");

        assert_eq!(config.api_base_url, "http://127.0.0.1:9999");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(
            config.invoice_description("Milk x 2"),
            "Shopping Cart: Milk x 2"
        );
    }

    #[test]
    fn test_description_without_prefix() {
        let config = XenditConfig::new("xnd_development_abc").with_description_prefix("");
        assert_eq!(config.invoice_description("Milk x 2"), "Milk x 2");
    }

    #[test]
    fn test_parse_timeout_secs() {
        assert_eq!(parse_timeout_secs("45").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_timeout_secs(" 5 ").unwrap(), Duration::from_secs(5));

        for bad in ["", "abc", "0", "-3", "1.5"] {
            assert!(
                matches!(parse_timeout_secs(bad), Err(ShopError::Configuration(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_from_env_missing_key() {
        env::remove_var("XENDIT_SECRET_KEY");

        let result = XenditConfig::from_env();
        assert!(result.is_err());
    }
}
