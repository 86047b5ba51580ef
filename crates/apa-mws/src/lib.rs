//! # apa-mws
//!
//! MWS transport and credential validation for the hosted-widgets gateway.
//!
//! This crate provides:
//!
//! 1. **MwsClient** - `MwsTransport` over `reqwest`
//!    - Region and environment specific endpoints
//!    - XML `Error` parsing
//!
//! 2. **CredentialValidator** - settings-save hook
//!    - Single `GetOrderReferenceDetails` round trip
//!    - Persists `amazon_keys_setup_and_validated`
//!    - Reports failures to the operator
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use apa_mws::CredentialValidator;
//! use apa_core::{FixedStorefront, NoticeBoard};
//!
//! let validator = CredentialValidator::for_mws(Arc::new(FixedStorefront::new("US")));
//! let notices = NoticeBoard::new();
//!
//! let outcome = validator.validate_api_keys(&store, &notices).await;
//! if !outcome.validated {
//!     // notices.errors() holds the message for the operator
//! }
//! ```

pub mod client;
pub mod config;
pub mod response;
pub mod validator;

// Re-exports
pub use client::MwsClient;
pub use config::{MwsConfig, API_VERSION};
pub use response::{parse_error_response, XmlError};
pub use validator::{
    CredentialValidator, MwsClientFactory, TransportFactory, ValidationOutcome,
    PING_ORDER_REFERENCE_ID,
};
