//! # SubSave Grid
//!
//! HTTP proxy for the Grid payments API.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export GRID_API_KEY=grid_sk_...
//! export GRID_ENVIRONMENT=sandbox
//!
//! # Run the server
//! subsave-grid
//! ```

use grid_api::{routes, state::AppState};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    // Print banner
    print_banner();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    match state.service.client_info() {
        Ok(client) => info!(
            "Grid: environment={}, api_key={}",
            client.environment, client.api_key
        ),
        // The proxy still starts; Grid calls fail with a config error until fixed
        Err(e) => warn!("Grid client not configured: {}", e),
    }
    if !state.advisor_enabled() {
        info!("Pricing advisor disabled");
    }

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("🚀 SubSave Grid starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("💳 Transactions: POST http://{}/api/v1/transactions", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// `LOG_FORMAT=json` switches to structured output
fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn print_banner() {
    println!(
        r#"
  💸 SubSave Grid 💸
  ━━━━━━━━━━━━━━━━━━━━━━━
  Grid payments proxy
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
