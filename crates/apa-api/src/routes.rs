//! # Routes
//!
//! Axum router configuration for the gateway API.

use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  /health - Health check
/// - GET  /api/v1/widget - Widget script URL for the current settings
/// - GET  /api/v1/settings - Current settings (access key masked)
/// - POST /api/v1/settings - Save settings and validate the API keys
/// - GET  /checkout - Resolve shopper identity (query + cookies)
/// - POST /checkout - Resolve shopper identity (query + form + cookies)
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/widget", get(handlers::widget))
        .route(
            "/settings",
            get(handlers::get_settings).post(handlers::save_settings),
        );

    Router::new()
        // Health check at root
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        // Shopper checkout steps
        .route(
            "/checkout",
            get(handlers::checkout_identity).post(handlers::checkout_identity_form),
        )
        // API v1
        .nest("/api/v1", api_routes)
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
