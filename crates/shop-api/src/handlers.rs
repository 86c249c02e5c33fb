//! # Request Handlers
//!
//! Axum request handlers for the self-checkout API.
//! The caller-side guards live here: quantities outside 1..=999 are rejected
//! before they reach the cart, and only one checkout may be in flight at a time.

use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shop_core::{
    history_from_user_record, parse_tag_text, CartSnapshot, Catalog, CheckoutResult, Discount,
    LineItem, Price, Product, Receipt, ShopError, Transaction, UserIdentity, UserProfile,
    MAX_LINE_QUANTITY,
};
use tracing::{info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Stored on the user's record the first time they sign in
    #[serde(default)]
    pub profile_photo_url: Option<String>,
}

/// Scan request: the decoded tag text, or a product id read some other way
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub tag_text: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
}

/// Quantity update request
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

/// Cart as shown to the shopper
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<LineItem>,
    pub total: Price,
    pub total_display: String,
    pub item_count: u32,
    pub checkout_enabled: bool,
}

impl From<CartSnapshot> for CartResponse {
    fn from(snapshot: CartSnapshot) -> Self {
        let total = snapshot.total();
        Self {
            total_display: total.display(),
            item_count: snapshot.item_count(),
            checkout_enabled: snapshot.checkout_enabled(),
            items: snapshot.items,
            total,
        }
    }
}

/// Login response
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserIdentity,
    pub cart: CartResponse,
}

/// Scan response
#[derive(Debug, Serialize)]
pub struct ScanResponse {
    /// The scanned line item after the scan
    pub item: LineItem,
    pub cart: CartResponse,
}

/// Checkout response
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Invoice URL (redirect the payer here)
    pub redirect_url: String,
    pub amount: Price,
}

/// One past purchase with its receipt
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub transaction: Transaction,
    pub receipt: Receipt,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    /// Short text for a transient notification
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code,
            message: message.into(),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn shop_error_to_response(err: ShopError) -> ApiError {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code, err.user_message());
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

fn bad_request(error: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(error, 400, "Invalid request")),
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "nfc-cart",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Log in and start a fresh cart
#[instrument(skip(state, request), fields(uid = %request.uid))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    if request.uid.trim().is_empty() {
        return Err(bad_request("uid is required"));
    }

    let mut identity = UserIdentity::new(request.uid);
    if let Some(email) = request.email {
        identity = identity.with_email(email);
    }
    if let Some(name) = request.display_name {
        identity = identity.with_display_name(name);
    }

    let user = state.start_session(identity, request.profile_photo_url.as_deref());
    let (cart, _) = state.current_cart().map_err(shop_error_to_response)?;

    Ok(Json(SessionResponse {
        user,
        cart: cart.snapshot().into(),
    }))
}

/// Log out; the cart is discarded
pub async fn logout(State(state): State<AppState>) -> StatusCode {
    if let Some(user) = state.end_session() {
        info!("Logged out {}", user.uid);
    }
    StatusCode::NO_CONTENT
}

/// Current cart
pub async fn get_cart(State(state): State<AppState>) -> Result<Json<CartResponse>, ApiError> {
    let (cart, _) = state.current_cart().map_err(shop_error_to_response)?;
    Ok(Json(cart.snapshot().into()))
}

/// Scan a tag (or product id) into the cart
#[instrument(skip(state, request))]
pub async fn scan(
    State(state): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> Result<Json<ScanResponse>, ApiError> {
    let (cart, _) = state.current_cart().map_err(shop_error_to_response)?;

    let product_id = match (request.tag_text, request.product_id) {
        (Some(text), _) => parse_tag_text(&text)
            .into_product_id()
            .map_err(shop_error_to_response)?,
        (None, Some(id)) if !id.trim().is_empty() => id.trim().to_string(),
        _ => return Err(bad_request("Provide 'tag_text' or 'product_id'")),
    };

    let item = state
        .scanner
        .scan(&cart, &product_id)
        .await
        .map_err(shop_error_to_response)?;

    Ok(Json(ScanResponse {
        item,
        cart: cart.snapshot().into(),
    }))
}

/// Set the quantity of a line item
#[instrument(skip(state, request), fields(quantity = request.quantity))]
pub async fn update_item(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let (cart, _) = state.current_cart().map_err(shop_error_to_response)?;

    // Removing goes through DELETE
    if request.quantity == 0 || request.quantity > MAX_LINE_QUANTITY {
        return Err(shop_error_to_response(ShopError::InvalidQuantity {
            product_id,
            quantity: request.quantity,
        }));
    }

    if !cart.update_quantity(&product_id, request.quantity) {
        return Err(shop_error_to_response(ShopError::ItemNotInCart { product_id }));
    }

    Ok(Json(cart.snapshot().into()))
}

/// Remove a line item (idempotent)
pub async fn remove_item(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let (cart, _) = state.current_cart().map_err(shop_error_to_response)?;
    cart.remove(&product_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Check out the current cart
#[instrument(skip(state))]
pub async fn checkout(State(state): State<AppState>) -> Result<Json<CheckoutResponse>, ApiError> {
    let (cart, payer_email) = state.current_cart().map_err(shop_error_to_response)?;

    let snapshot = cart.snapshot();
    if !snapshot.checkout_enabled() {
        return Err(shop_error_to_response(ShopError::EmptyCart));
    }

    let _guard = state.try_begin_checkout().ok_or_else(|| {
        warn!("Rejected checkout: another checkout is in flight");
        shop_error_to_response(ShopError::CheckoutInFlight)
    })?;

    match state.checkout.checkout(&snapshot, payer_email.as_deref()).await {
        CheckoutResult::Success { redirect_url } => Ok(Json(CheckoutResponse {
            redirect_url,
            amount: snapshot.total(),
        })),
        CheckoutResult::Failure(err) => Err(shop_error_to_response(err)),
    }
}

/// Get a product by ID
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    state
        .catalog
        .require(&product_id)
        .await
        .map(Json)
        .map_err(shop_error_to_response)
}

/// List discounts
pub async fn list_discounts(State(state): State<AppState>) -> Json<Vec<Discount>> {
    Json(state.catalog.discounts.clone())
}

/// Profile of the signed-in user
pub async fn profile(State(state): State<AppState>) -> Result<Json<UserProfile>, ApiError> {
    let user = state.current_user().map_err(shop_error_to_response)?;
    let record = state.users.get(&user.uid);
    Ok(Json(UserProfile::new(&user, record.as_ref())))
}

/// Purchase history of the signed-in user
pub async fn history(State(state): State<AppState>) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let user = state.current_user().map_err(shop_error_to_response)?;

    let transactions = state
        .users
        .get(&user.uid)
        .map(|record| history_from_user_record(&record))
        .unwrap_or_default();

    let currency = state.config.currency;
    Ok(Json(
        transactions
            .into_iter()
            .map(|transaction| HistoryEntry {
                receipt: Receipt::for_transaction(&transaction, currency),
                transaction,
            })
            .collect(),
    ))
}
