//! # shop-api
//!
//! HTTP API layer for nfc-cart-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints for the session, cart, scans and checkout
//! - The single-flight checkout guard
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/v1/session` | Log in |
//! | DELETE | `/api/v1/session` | Log out |
//! | GET | `/api/v1/profile` | Signed-in user's profile |
//! | GET | `/api/v1/cart` | Current cart |
//! | POST | `/api/v1/cart/scan` | Scan a tag |
//! | PUT | `/api/v1/cart/items/{id}` | Set quantity |
//! | DELETE | `/api/v1/cart/items/{id}` | Remove item |
//! | POST | `/api/v1/checkout` | Create invoice |
//! | GET | `/api/v1/products/{id}` | Get product |
//! | GET | `/api/v1/discounts` | List discounts |
//! | GET | `/api/v1/history` | Purchase history |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState, UserDirectory};
