//! # apa-api
//!
//! HTTP API layer for the hosted-widgets gateway.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Widget script resolution for the storefront
//! - Operator settings with credential validation on save
//! - Shopper identity resolution across checkout steps
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/v1/widget` | Widget script URL |
//! | GET | `/api/v1/settings` | Current settings |
//! | POST | `/api/v1/settings` | Save settings, validate keys |
//! | GET | `/checkout` | Resolve reference id and access token |
//! | POST | `/checkout` | Same, reading the posted form |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
