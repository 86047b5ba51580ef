//! # apa-core
//!
//! Core types and traits for the Amazon Pay hosted-widgets gateway.
//!
//! This crate provides:
//! - `Settings` snapshots and the `SettingsStore` trait (memory and TOML file stores)
//! - `resolve_widget_url` for picking the widget script per region and environment
//! - `RequestContext` for reconciling the shopper's reference id and access token
//! - `MwsTransport` trait implemented by provider clients
//! - `AdminNotices` for operator-visible messages
//! - `ApaError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use apa_core::{resolve_widget_url, FixedStorefront, MemorySession, RequestContext, Settings};
//!
//! let settings = Settings::load(&store);
//! let script = resolve_widget_url(&settings, &FixedStorefront::new("GB"))?;
//!
//! let mut session = MemorySession::new();
//! let identity = RequestContext::new()
//!     .with_query(query)
//!     .with_session(&mut session)
//!     .identity();
//! ```

pub mod error;
pub mod notice;
pub mod region;
pub mod session;
pub mod settings;
pub mod transport;
pub mod widgets;

// Re-exports for convenience
pub use error::{ApaError, ApaResult};
pub use notice::{AdminNotices, Notice, NoticeBoard, NoticeLevel};
pub use region::{Environment, Region};
pub use session::{
    MemorySession, RequestContext, SessionIdentity, SessionKey, SessionStore,
};
pub use settings::{
    keys_validated, DateTimeSettings, FileSettingsStore, MemorySettingsStore, Settings,
    SettingsStore,
};
pub use transport::{ApiErrorBody, ApiRequest, ApiResponse, BoxedTransport, MwsTransport};
pub use widgets::{resolve_region, resolve_widget_url, FixedStorefront, Storefront};
