//! # MWS Client
//!
//! `reqwest` implementation of [`MwsTransport`] against the Off-Amazon
//! Payments section of MWS. Requests are posted as form bodies; responses
//! are parsed for an `Error` element.

use crate::config::MwsConfig;
use crate::response::parse_error_response;
use apa_core::{
    ApaError, ApaResult, ApiRequest, ApiResponse, MwsTransport, Settings, Storefront,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use tracing::{debug, instrument, warn};

/// MWS API client
pub struct MwsClient {
    config: MwsConfig,
    client: Client,
}

impl MwsClient {
    /// Create a new client
    pub fn new(config: MwsConfig) -> ApaResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApaError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from a settings snapshot
    pub fn from_settings(settings: &Settings, storefront: &dyn Storefront) -> ApaResult<Self> {
        Self::new(MwsConfig::from_settings(settings, storefront)?)
    }

    pub fn config(&self) -> &MwsConfig {
        &self.config
    }

    /// Form body for an action: common MWS parameters followed by the action's own
    fn form_params(&self, request: &ApiRequest, now: DateTime<Utc>) -> Vec<(String, String)> {
        let mut params = vec![
            ("Action".to_string(), request.action.clone()),
            ("AWSAccessKeyId".to_string(), self.config.access_key.clone()),
            ("SellerId".to_string(), self.config.seller_id.clone()),
            (
                "Timestamp".to_string(),
                now.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            ("Version".to_string(), self.config.api_version.clone()),
        ];

        for (name, value) in &request.params {
            params.push((name.clone(), value.clone()));
        }

        params
    }
}

#[async_trait]
impl MwsTransport for MwsClient {
    #[instrument(skip(self, request), fields(action = %request.action))]
    async fn request(&self, request: &ApiRequest) -> ApaResult<ApiResponse> {
        let url = self.config.endpoint_url();
        let params = self.form_params(request, Utc::now());

        debug!(
            "Calling MWS: region={}, url={}, params={}",
            self.config.region,
            url,
            params.len()
        );

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| ApaError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApaError::Transport(e.to_string()))?;

        let error = match parse_error_response(&body) {
            Ok(error) => error,
            Err(e) if status.is_success() => {
                return Err(ApaError::Serialization(format!(
                    "Failed to parse MWS response: {}",
                    e
                )));
            }
            Err(_) => None,
        };

        if let Some(ref error) = error {
            debug!("MWS error response: status={}, code={}", status, error.code);
        } else if !status.is_success() {
            warn!("MWS request failed without error body: status={}", status);
            return Err(ApaError::Provider {
                code: format!("HTTP {}", status.as_u16()),
                message: body,
            });
        }

        Ok(ApiResponse {
            status: status.as_u16(),
            error,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apa_core::{Environment, Region};
    use chrono::TimeZone;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SANDBOX_PATH: &str = "/OffAmazonPayments_Sandbox/2013-01-01";

    fn client_for(server: &MockServer) -> MwsClient {
        let config = MwsConfig::new(
            "AKIAEXAMPLE",
            "secret",
            "A2SELLER",
            Region::Us,
            Environment::Sandbox,
        )
        .with_api_base_url(server.uri());
        MwsClient::new(config).unwrap()
    }

    #[test]
    fn test_form_params() {
        let config = MwsConfig::new(
            "AKIAEXAMPLE",
            "secret",
            "A2SELLER",
            Region::Gb,
            Environment::Production,
        );
        let client = MwsClient::new(config).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let request = ApiRequest::new("GetOrderReferenceDetails")
            .param("AmazonOrderReferenceId", "S00-0000000-0000000");
        let params = client.form_params(&request, now);

        assert_eq!(params[0], ("Action".to_string(), "GetOrderReferenceDetails".to_string()));
        assert!(params.contains(&("Timestamp".to_string(), "2024-01-02T03:04:05Z".to_string())));
        assert!(params.contains(&("Version".to_string(), "2013-01-01".to_string())));
        assert!(params.contains(&(
            "AmazonOrderReferenceId".to_string(),
            "S00-0000000-0000000".to_string()
        )));
        assert!(!params.iter().any(|(_, v)| v == "secret"));
    }

    #[tokio::test]
    async fn test_error_response_is_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SANDBOX_PATH))
            .and(body_string_contains("Action=GetOrderReferenceDetails"))
            .respond_with(ResponseTemplate::new(404).set_body_string(
                "<ErrorResponse><Error><Type>Sender</Type><Code>InvalidOrderReferenceId</Code>\
                 <Message>invalid</Message></Error></ErrorResponse>",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server)
            .request(&ApiRequest::new("GetOrderReferenceDetails"))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.error_code(), Some("InvalidOrderReferenceId"));
    }

    #[tokio::test]
    async fn test_success_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SANDBOX_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<GetOrderReferenceDetailsResponse/>"),
            )
            .mount(&server)
            .await;

        let response = client_for(&server)
            .request(&ApiRequest::new("GetOrderReferenceDetails"))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_http_failure_without_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .request(&ApiRequest::new("GetOrderReferenceDetails"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApaError::Provider { ref code, .. } if code == "HTTP 503"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let config = MwsConfig::new("AK", "SK", "SELLER", Region::Us, Environment::Sandbox)
            .with_api_base_url("http://127.0.0.1:1")
            .with_timeout_secs(2);
        let client = MwsClient::new(config).unwrap();

        let err = client
            .request(&ApiRequest::new("GetOrderReferenceDetails"))
            .await
            .unwrap_err();

        assert!(err.is_transport());
    }
}
