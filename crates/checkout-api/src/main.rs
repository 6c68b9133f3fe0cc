//! # usdc-checkout
//!
//! Hosted USDC checkout pages with Solana blink payments.
//!
//! ## Usage
//!
//! ```bash
//! # Optional: persistent storage and image uploads
//! export DATABASE_URL=postgres://localhost/checkout
//! export CLOUDINARY_CLOUD_NAME=...
//! export CLOUDINARY_API_KEY=...
//! export CLOUDINARY_API_SECRET=...
//! export OKTO_API_SECRET=...
//!
//! # Run the server
//! usdc-checkout
//! ```

use checkout_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; LOG_FORMAT=json for structured output
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json");
    tracing_subscriber::registry()
        .with(json.then(|| fmt::layer().json().flatten_event(true)))
        .with((!json).then(fmt::layer))
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let state = AppState::new().await?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Payment network: {}", state.rail.network());
    info!("Blink chain id: {}", state.config.blockchain_id());

    let app = routes::create_router(state);

    info!("usdc-checkout starting on http://{}", addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Blinks: GET http://{}/actions.json", addr);
        info!("Pages: POST http://{}/api/checkout-pages", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  usdc-checkout
  ━━━━━━━━━━━━━━━━━━━━━━━
  USDC checkout pages on Solana
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
