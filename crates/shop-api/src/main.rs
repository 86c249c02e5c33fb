//! # NFC Cart RS
//!
//! Self-checkout backend: scan NFC tags into a cart, pay by hosted invoice.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export XENDIT_SECRET_KEY=xnd_development_...
//! export STORE_CURRENCY=idr
//!
//! # Run the server
//! nfc-cart
//! ```

use shop_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Store currency: {}", state.config.currency);
    info!("Products loaded: {}", state.catalog.products.len());
    info!("Payment provider: {}", state.checkout.provider_name());

    let app = routes::create_router(state);

    info!("NFC cart starting on http://{}", addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Scan: POST http://{}/api/v1/cart/scan", addr);
        info!("Checkout: POST http://{}/api/v1/checkout", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  NFC Cart RS
  ━━━━━━━━━━━━━━━━━━━━━━━
  Scan, pay, go
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
