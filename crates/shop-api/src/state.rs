//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the catalog, the active shopping session, the checkout coordinator
//! and the single-flight flag that guards it.

use serde_json::Value;
use shop_core::{
    parse_discounts, BoxedPaymentStrategy, CartHandle, CheckoutCoordinator, Currency,
    new_user_record, InMemoryCatalog, ScanHandler, ShopError, ShopResult, ShoppingSession, UserIdentity,
    DEFAULT_EXTERNAL_ID_PREFIX,
};
use shop_xendit::{checkout_timeout_from_env, XenditConfig, XenditInvoiceStrategy};
use std::collections::HashMap;
use std::net::{AddrParseError, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Currency of catalog prices
    pub currency: Currency,
    /// Bound on one checkout call
    pub checkout_timeout: Duration,
    /// Prefix for invoice external ids
    pub external_id_prefix: String,
}

impl AppConfig {
    /// Load from environment variables.
    ///
    /// Fails only on a malformed `CHECKOUT_TIMEOUT_SECS`.
    pub fn from_env() -> ShopResult<Self> {
        dotenvy::dotenv().ok();

        let currency = match std::env::var("STORE_CURRENCY") {
            Ok(code) => Currency::from_code(&code).unwrap_or_else(|| {
                tracing::warn!("Unknown STORE_CURRENCY {}, using IDR", code);
                Currency::IDR
            }),
            Err(_) => Currency::IDR,
        };

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            currency,
            checkout_timeout: checkout_timeout_from_env()?,
            external_id_prefix: std::env::var("EXTERNAL_ID_PREFIX")
                .unwrap_or_else(|_| DEFAULT_EXTERNAL_ID_PREFIX.to_string()),
        })
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Store data loaded at startup
#[derive(Debug, Clone, Default)]
pub struct StoreData {
    pub catalog: InMemoryCatalog,
    /// User records keyed by uid
    pub users: HashMap<String, Value>,
}

/// User records keyed by uid, writable so first logins can be recorded
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    records: Arc<RwLock<HashMap<String, Value>>>,
}

impl UserDirectory {
    pub fn new(records: HashMap<String, Value>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Value>> {
        self.records.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Value>> {
        self.records.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// A copy of the stored record
    pub fn get(&self, uid: &str) -> Option<Value> {
        self.read().get(uid).cloned()
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.read().contains_key(uid)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Record a first-time user. Returns false if a record already exists.
    pub fn provision(&self, identity: &UserIdentity, profile_photo_url: Option<&str>) -> bool {
        let mut records = self.write();
        if records.contains_key(&identity.uid) {
            return false;
        }
        records.insert(
            identity.uid.clone(),
            new_user_record(identity, profile_photo_url),
        );
        tracing::info!(uid = %identity.uid, "Provisioned user record");
        true
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Product catalog
    pub catalog: Arc<InMemoryCatalog>,
    /// Scan handler over the catalog
    pub scanner: ScanHandler,
    /// Checkout coordinator
    pub checkout: CheckoutCoordinator,
    /// User records keyed by uid
    pub users: UserDirectory,
    /// Application config
    pub config: AppConfig,
    session: Arc<Mutex<Option<ShoppingSession>>>,
    checkout_in_flight: Arc<AtomicBool>,
}

impl AppState {
    /// Create a new AppState with the Xendit strategy
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let store = load_store(config.currency)?;

        let xendit_config = XenditConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Xendit: {}", e))?
            .with_timeout(config.checkout_timeout);
        let strategy = XenditInvoiceStrategy::new(xendit_config)
            .map_err(|e| anyhow::anyhow!("Failed to initialize Xendit: {}", e))?;

        Ok(Self::with_parts(config, store, Arc::new(strategy)))
    }

    /// Assemble state from explicit parts (used by tests)
    pub fn with_parts(config: AppConfig, store: StoreData, strategy: BoxedPaymentStrategy) -> Self {
        let catalog = Arc::new(store.catalog);
        let checkout = CheckoutCoordinator::new(strategy)
            .with_timeout(config.checkout_timeout)
            .with_external_id_prefix(config.external_id_prefix.clone());

        Self {
            scanner: ScanHandler::new(catalog.clone()),
            catalog,
            checkout,
            users: UserDirectory::new(store.users),
            config,
            session: Arc::new(Mutex::new(None)),
            checkout_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    fn session_lock(&self) -> MutexGuard<'_, Option<ShoppingSession>> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a session, replacing (and discarding) any current one.
    ///
    /// Missing email and display name are filled in from the user's stored
    /// record. A uid with no record gets one.
    pub fn start_session(
        &self,
        mut identity: UserIdentity,
        profile_photo_url: Option<&str>,
    ) -> UserIdentity {
        match self.users.get(&identity.uid) {
            Some(record) => {
                let stored = |key: &str| {
                    record
                        .get(key)
                        .and_then(Value::as_str)
                        .filter(|v| !v.trim().is_empty())
                        .map(str::to_string)
                };
                if identity.email.is_none() {
                    if let Some(email) = stored("email") {
                        identity = identity.with_email(email);
                    }
                }
                if identity.display_name.is_none() {
                    if let Some(name) = stored("username") {
                        identity = identity.with_display_name(name);
                    }
                }
            }
            None => {
                self.users.provision(&identity, profile_photo_url);
            }
        }

        let session = ShoppingSession::start(identity.clone(), self.config.currency);
        if let Some(previous) = self.session_lock().replace(session) {
            previous.end();
        }
        identity
    }

    /// End the current session, if any
    pub fn end_session(&self) -> Option<UserIdentity> {
        self.session_lock().take().map(ShoppingSession::end)
    }

    /// The signed-in user
    pub fn current_user(&self) -> ShopResult<UserIdentity> {
        self.session_lock()
            .as_ref()
            .map(|s| s.identity().clone())
            .ok_or(ShopError::NoSession)
    }

    /// The current cart and payer email.
    ///
    /// The handle is cloned out so the session lock is released before any
    /// await.
    pub fn current_cart(&self) -> ShopResult<(CartHandle, Option<String>)> {
        self.session_lock()
            .as_ref()
            .map(|s| (s.cart().clone(), s.payer_email().map(str::to_string)))
            .ok_or(ShopError::NoSession)
    }

    /// Claim the checkout slot; `None` if a checkout is already running
    pub fn try_begin_checkout(&self) -> Option<CheckoutGuard> {
        self.checkout_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CheckoutGuard {
                flag: self.checkout_in_flight.clone(),
            })
    }

    pub fn checkout_in_flight(&self) -> bool {
        self.checkout_in_flight.load(Ordering::Acquire)
    }
}

/// Releases the checkout slot when dropped
pub struct CheckoutGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for CheckoutGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Load store data from the config directory.
///
/// `store.json` (a database export with `products`, `discounts` and
/// `userDetails` nodes) takes precedence over `catalog.toml`.
fn load_store(currency: Currency) -> anyhow::Result<StoreData> {
    for path in ["config/store.json", "../config/store.json", "../../config/store.json"] {
        if let Ok(content) = std::fs::read_to_string(path) {
            let value: Value = serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            let store = store_from_export(&value, currency)?;
            tracing::info!(
                "Loaded {} products and {} users from {}",
                store.catalog.products.len(),
                store.users.len(),
                path
            );
            return Ok(store);
        }
    }

    for path in ["config/catalog.toml", "../config/catalog.toml", "../../config/catalog.toml"] {
        if let Ok(content) = std::fs::read_to_string(path) {
            let catalog = InMemoryCatalog::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded {} products from {}", catalog.products.len(), path);
            return Ok(StoreData {
                catalog,
                users: HashMap::new(),
            });
        }
    }

    // Return empty store if no config found
    tracing::warn!("No store data found, using empty catalog");
    Ok(StoreData::default())
}

/// Build store data from a database export
pub fn store_from_export(value: &Value, currency: Currency) -> ShopResult<StoreData> {
    let mut catalog = match value.get("products") {
        Some(products) => InMemoryCatalog::from_records(products, currency)?,
        None => InMemoryCatalog::new(),
    };
    if let Some(discounts) = value.get("discounts") {
        catalog.discounts = parse_discounts(discounts);
    }

    // Older exports name the user node `users`
    let users = value
        .get("userDetails")
        .or_else(|| value.get("users"))
        .and_then(Value::as_object)
        .map(|users| users.iter().map(|(uid, record)| (uid.clone(), record.clone())).collect())
        .unwrap_or_default();

    Ok(StoreData { catalog, users })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_app_config_defaults() {
        // Clear env vars for test
        std::env::remove_var("HOST");
        std::env::remove_var("PORT");
        std::env::remove_var("STORE_CURRENCY");
        std::env::remove_var("CHECKOUT_TIMEOUT_SECS");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.currency, Currency::IDR);
        assert_eq!(config.checkout_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "test".to_string(),
            currency: Currency::IDR,
            checkout_timeout: Duration::from_secs(30),
            external_id_prefix: "nfc-shop".to_string(),
        };

        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");

        let bad = AppConfig {
            host: "not a host".to_string(),
            ..config
        };
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn test_store_from_export() {
        let export = json!({
            "products": {
                "-N1": { "ProdID": "P1", "prodName": "Milk", "prodPrice": "12,500", "imageUrl": "" }
            },
            "discounts": [
                { "id": "1", "title": "Black Friday Sale", "description": "50% off" }
            ],
            "userDetails": {
                "uid-1": {
                    "uid": "uid-1",
                    "username": "ana",
                    "email": "ana@example.com",
                    "profilePhotoUrl": "",
                    "transactionHistory": []
                }
            }
        });

        let store = store_from_export(&export, Currency::IDR).unwrap();
        assert_eq!(store.catalog.get("P1").unwrap().price.amount, 12500);
        assert_eq!(store.catalog.discounts.len(), 1);
        assert_eq!(store.users["uid-1"]["email"], "ana@example.com");
    }

    #[test]
    fn test_store_from_export_legacy_users_node() {
        let export = json!({
            "users": { "uid-2": { "username": "budi" } }
        });

        let store = store_from_export(&export, Currency::IDR).unwrap();
        assert!(store.catalog.products.is_empty());
        assert!(store.users.contains_key("uid-2"));
    }

    #[test]
    fn test_user_directory_provisions_once() {
        let users = UserDirectory::default();
        let identity = UserIdentity::new("uid-9").with_email("new@b.co");

        assert!(users.provision(&identity, Some("https://img/9.png")));
        assert!(!users.provision(&UserIdentity::new("uid-9"), None));
        assert_eq!(users.len(), 1);

        let record = users.get("uid-9").unwrap();
        assert_eq!(record["email"], "new@b.co");
        assert_eq!(record["profilePhotoUrl"], "https://img/9.png");
    }
}
