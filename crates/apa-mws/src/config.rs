//! # MWS Configuration
//!
//! Endpoint and credential configuration for the Off-Amazon Payments MWS API.
//! Credentials come from the gateway settings; the endpoint can be overridden
//! with `MWS_API_BASE_URL` (for mocks and proxies).

use apa_core::{
    resolve_region, ApaError, ApaResult, Environment, Region, Settings, Storefront,
};
use std::env;

/// API version of the Off-Amazon Payments section
pub const API_VERSION: &str = "2013-01-01";

/// MWS API configuration
#[derive(Debug, Clone)]
pub struct MwsConfig {
    /// Access key id
    pub access_key: String,

    /// Secret key
    pub secret_key: String,

    /// Merchant seller id
    pub seller_id: String,

    /// Regional deployment
    pub region: Region,

    /// Sandbox or production
    pub environment: Environment,

    /// API base URL (scheme + host)
    pub api_base_url: String,

    /// API version
    pub api_version: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl MwsConfig {
    /// Create config with explicit values
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        seller_id: impl Into<String>,
        region: Region,
        environment: Environment,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            seller_id: seller_id.into(),
            region,
            environment,
            api_base_url: Self::endpoint_host(region).to_string(),
            api_version: API_VERSION.to_string(),
            timeout_secs: 30,
        }
    }

    /// Build config from a settings snapshot.
    ///
    /// An empty region falls back to the storefront base country, exactly
    /// as the widget resolver does. `MWS_API_BASE_URL` overrides the host.
    pub fn from_settings(settings: &Settings, storefront: &dyn Storefront) -> ApaResult<Self> {
        dotenvy::dotenv().ok();

        let region = resolve_region(settings, storefront)?;
        let config = Self::new(
            settings.mws_access_key.clone(),
            settings.secret_key.clone(),
            settings.seller_id.clone(),
            region,
            Environment::from_sandbox(settings.sandbox),
        );

        config.with_base_url_override(env::var("MWS_API_BASE_URL").ok())
    }

    /// Apply an operator-supplied base URL; blank means no override
    pub fn with_base_url_override(self, url: Option<String>) -> ApaResult<Self> {
        let url = match url {
            Some(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => return Ok(self),
        };

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ApaError::Configuration(format!(
                "MWS_API_BASE_URL must be an http(s) URL, got '{}'",
                url
            )));
        }

        Ok(self.with_api_base_url(url))
    }

    /// MWS host for a region
    pub fn endpoint_host(region: Region) -> &'static str {
        match region {
            Region::Us => "https://mws.amazonservices.com",
            Region::Gb | Region::Eu => "https://mws-eu.amazonservices.com",
            Region::Jp => "https://mws.amazonservices.jp",
        }
    }

    /// Service path for the configured environment
    pub fn service_path(&self) -> String {
        match self.environment {
            Environment::Sandbox => format!("/OffAmazonPayments_Sandbox/{}", self.api_version),
            Environment::Production => format!("/OffAmazonPayments/{}", self.api_version),
        }
    }

    /// Full endpoint URL
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}{}",
            self.api_base_url.trim_end_matches('/'),
            self.service_path()
        )
    }

    /// Check if using the sandbox
    pub fn is_sandbox(&self) -> bool {
        self.environment.is_sandbox()
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Builder: set request timeout
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apa_core::FixedStorefront;

    #[test]
    fn test_endpoints_per_region() {
        let config = MwsConfig::new("AK", "SK", "SELLER", Region::Us, Environment::Sandbox);
        assert_eq!(
            config.endpoint_url(),
            "https://mws.amazonservices.com/OffAmazonPayments_Sandbox/2013-01-01"
        );

        let config = MwsConfig::new("AK", "SK", "SELLER", Region::Gb, Environment::Production);
        assert_eq!(
            config.endpoint_url(),
            "https://mws-eu.amazonservices.com/OffAmazonPayments/2013-01-01"
        );

        let config = MwsConfig::new("AK", "SK", "SELLER", Region::Jp, Environment::Production);
        assert!(config.endpoint_url().starts_with("https://mws.amazonservices.jp/"));
        assert!(!config.is_sandbox());
    }

    #[test]
    fn test_base_url_override() {
        let config = MwsConfig::new("AK", "SK", "SELLER", Region::Eu, Environment::Sandbox)
            .with_api_base_url("http://127.0.0.1:9000/");
        assert_eq!(
            config.endpoint_url(),
            "http://127.0.0.1:9000/OffAmazonPayments_Sandbox/2013-01-01"
        );
    }

    #[test]
    fn test_base_url_override_validation() {
        let config = MwsConfig::new("AK", "SK", "SELLER", Region::Us, Environment::Production);

        let unchanged = config.clone().with_base_url_override(Some("  ".to_string())).unwrap();
        assert_eq!(unchanged.api_base_url, "https://mws.amazonservices.com");

        let mocked = config
            .clone()
            .with_base_url_override(Some("http://localhost:4566".to_string()))
            .unwrap();
        assert_eq!(mocked.api_base_url, "http://localhost:4566");

        let err = config
            .with_base_url_override(Some("mws.internal:8080".to_string()))
            .unwrap_err();
        assert!(matches!(err, ApaError::Configuration(_)));
    }

    #[test]
    fn test_from_settings_uses_base_country() {
        let settings = Settings::default()
            .with_sandbox(true)
            .with_credentials("AK", "SK");

        let config = MwsConfig::from_settings(&settings, &FixedStorefront::new("JP")).unwrap();
        assert_eq!(config.region, Region::Jp);
        assert!(config.is_sandbox());
        assert_eq!(config.access_key, "AK");
    }

    #[test]
    fn test_from_settings_rejects_unknown_region() {
        let settings = Settings::default().with_region("xx");
        assert!(MwsConfig::from_settings(&settings, &FixedStorefront::default()).is_err());
    }
}
