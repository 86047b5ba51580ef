//! # Provider Transport Trait
//!
//! Seam between the gateway and the HTTP layer that talks to the
//! provider's MWS API.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            MwsTransport (trait)             │
//! │  ├── request(ApiRequest) -> ApiResponse     │
//! │  └── provider_name()                        │
//! └─────────────────────────────────────────────┘
//!                       ▲
//!          ┌────────────┴────────────┐
//!  ┌───────┴───────┐         ┌───────┴───────┐
//!  │   MwsClient   │         │ test doubles  │
//!  │  (apa-mws)    │         │               │
//!  └───────────────┘         └───────────────┘
//! ```

use crate::error::ApaResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A named action with its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub action: String,
    pub params: BTreeMap<String, String>,
}

impl ApiRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            params: BTreeMap::new(),
        }
    }

    /// Builder: add a parameter
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// `Error` element of a provider response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Parsed provider response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status of the exchange
    pub status: u16,
    /// Error element, when the provider returned one
    pub error: Option<ApiErrorBody>,
    /// Raw response body
    pub body: String,
}

impl ApiResponse {
    /// Successful response without an error element
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            error: None,
            body: body.into(),
        }
    }

    /// Response carrying a provider error code
    pub fn with_error(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: Some(ApiErrorBody {
                code: code.into(),
                message: message.into(),
            }),
            body: String::new(),
        }
    }

    /// `Error.Code`, if present
    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.code.as_str())
    }
}

/// Performs actions against the provider API.
///
/// `Err` means the provider could not be reached or answered with something
/// unparseable. A provider-level error is an `Ok` response whose
/// [`ApiResponse::error`] is set.
#[async_trait]
pub trait MwsTransport: Send + Sync {
    async fn request(&self, request: &ApiRequest) -> ApaResult<ApiResponse>;

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str {
        "amazon"
    }
}

/// Shared transport handle (dynamic dispatch)
pub type BoxedTransport = Arc<dyn MwsTransport>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::new("GetOrderReferenceDetails")
            .param("AmazonOrderReferenceId", "S00-0000000-0000000");

        assert_eq!(request.action, "GetOrderReferenceDetails");
        assert_eq!(
            request.params.get("AmazonOrderReferenceId").map(String::as_str),
            Some("S00-0000000-0000000")
        );
    }

    #[test]
    fn test_error_code() {
        assert_eq!(ApiResponse::ok("<ok/>").error_code(), None);
        let response = ApiResponse::with_error(400, "RequestExpired", "too old");
        assert_eq!(response.error_code(), Some("RequestExpired"));
    }

    #[tokio::test]
    async fn test_transport_trait_object() {
        struct Echo;

        #[async_trait]
        impl MwsTransport for Echo {
            async fn request(&self, request: &ApiRequest) -> ApaResult<ApiResponse> {
                Ok(ApiResponse::ok(request.action.clone()))
            }
        }

        let transport: BoxedTransport = Arc::new(Echo);
        let response = transport.request(&ApiRequest::new("Ping")).await.unwrap();
        assert_eq!(response.body, "Ping");
        assert_eq!(transport.provider_name(), "amazon");
    }
}
