//! # APA Gateway
//!
//! Amazon Pay hosted-widgets gateway.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export APA_SETTINGS_PATH=./apa-settings.toml
//! export APA_BASE_COUNTRY=GB
//!
//! # Run the server
//! apa-gateway
//! ```

use apa_api::{routes, state::AppState};
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

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    let settings = state.settings_snapshot();
    info!("Environment: {}", state.config.environment);
    info!("Storefront base country: {}", state.config.base_country);
    match &state.sessions {
        Some(_) => info!(
            "Shopper sessions: max={}, idle ttl={}s",
            state.config.max_sessions, state.config.session_ttl_secs
        ),
        None => info!("Shopper sessions disabled, checkout identity passes through"),
    }
    info!(
        "Payment region: {}, sandbox: {}, login app: {}",
        if settings.payment_region.is_empty() {
            "(base country)"
        } else {
            settings.payment_region.as_str()
        },
        settings.sandbox,
        settings.enable_login_app
    );

    let app = routes::create_router(state);

    info!("APA gateway starting on http://{}", addr);

    if !is_prod {
        info!("Widget: GET http://{}/api/v1/widget", addr);
        info!("Settings: POST http://{}/api/v1/settings", addr);
        info!("Checkout: GET http://{}/checkout", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  Amazon Pay Gateway
  ━━━━━━━━━━━━━━━━━━━━━━━
  Hosted widgets, credentials, shopper identity
  Version: {}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
