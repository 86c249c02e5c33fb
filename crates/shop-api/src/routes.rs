//! # Routes
//!
//! Axum router configuration for the self-checkout API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET    /health
/// - POST   /api/v1/session - Log in, fresh cart
/// - DELETE /api/v1/session - Log out, cart discarded
/// - GET    /api/v1/profile
/// - GET    /api/v1/cart
/// - POST   /api/v1/cart/scan
/// - PUT    /api/v1/cart/items/{product_id}
/// - DELETE /api/v1/cart/items/{product_id}
/// - POST   /api/v1/checkout
/// - GET    /api/v1/products/{product_id}
/// - GET    /api/v1/discounts
/// - GET    /api/v1/history
pub fn create_router(state: AppState) -> Router {
    // The shopper app runs on a separate origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Session
        .route("/session", post(handlers::login).delete(handlers::logout))
        .route("/profile", get(handlers::profile))
        // Cart
        .route("/cart", get(handlers::get_cart))
        .route("/cart/scan", post(handlers::scan))
        .route(
            "/cart/items/{product_id}",
            put(handlers::update_item).delete(handlers::remove_item),
        )
        // Checkout
        .route("/checkout", post(handlers::checkout))
        .route("/products/{product_id}", get(handlers::get_product))
        .route("/discounts", get(handlers::list_discounts))
        .route("/history", get(handlers::history));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
