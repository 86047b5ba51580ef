//! # Credential Validation
//!
//! Checks the operator's MWS keys whenever settings are saved.
//!
//! The check is a single `GetOrderReferenceDetails` call for a reference id
//! that cannot exist. Authenticated keys make the provider answer
//! `InvalidOrderReferenceId`, which counts as success. Any other error code,
//! or no answer at all, leaves the keys unvalidated.
//!
//! The outcome is persisted as `amazon_keys_setup_and_validated` (`0`/`1`).
//! `0` is written before anything else is checked, so the flag never reports
//! keys that are still being verified. It is flipped to `1` only on success.

use crate::client::MwsClient;
use apa_core::settings::keys;
use apa_core::{
    AdminNotices, ApaError, ApaResult, ApiRequest, BoxedTransport, DateTimeSettings, Settings,
    SettingsStore, Storefront,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Action used for the credential check
pub const PING_ACTION: &str = "GetOrderReferenceDetails";
/// Order reference id that never matches a real order
pub const PING_ORDER_REFERENCE_ID: &str = "S00-0000000-0000000";
/// Error code that proves the keys were accepted
pub const EXPECTED_PING_ERROR: &str = "InvalidOrderReferenceId";
/// Error code caused by clock skew between this host and the provider
pub const REQUEST_EXPIRED: &str = "RequestExpired";

pub const MISSING_SECRET_KEY_MESSAGE: &str = "Error: You must enter MWS Secret Key.";
pub const KEYS_VALIDATED_MESSAGE: &str = "MWS keys validated.";
pub const FLAG_WRITE_FAILED_MESSAGE: &str = "Error: could not save the credential check result.";
pub const INVALID_KEYS_MESSAGE: &str = "Error: MWS keys you provided are not valid. Please double-check that you entered them correctly and try again.";

fn request_expired_message(current_time: &str) -> String {
    format!(
        "Error: MWS responded with a RequestExpired error. This is typically caused by a system time issue. \
         Please make sure your system time is correct and try again. (Current system time: {})",
        current_time
    )
}

/// Result of one validation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Keys were accepted by the provider
    pub validated: bool,
    /// Message shown to the operator on failure
    pub message: Option<String>,
}

impl ValidationOutcome {
    fn validated() -> Self {
        Self {
            validated: true,
            message: None,
        }
    }

    fn failed(message: Option<String>) -> Self {
        Self {
            validated: false,
            message,
        }
    }
}

/// Builds the transport for a settings snapshot.
///
/// Credentials and region live in the settings, so the transport is built
/// per validation from the freshly loaded snapshot.
pub trait TransportFactory: Send + Sync {
    fn build(&self, settings: &Settings) -> ApaResult<BoxedTransport>;
}

/// Builds an [`MwsClient`] from the settings
pub struct MwsClientFactory {
    storefront: Arc<dyn Storefront>,
}

impl MwsClientFactory {
    pub fn new(storefront: Arc<dyn Storefront>) -> Self {
        Self { storefront }
    }
}

impl TransportFactory for MwsClientFactory {
    fn build(&self, settings: &Settings) -> ApaResult<BoxedTransport> {
        let client = MwsClient::from_settings(settings, self.storefront.as_ref())?;
        Ok(Arc::new(client))
    }
}

/// A prebuilt transport serves every snapshot
impl TransportFactory for BoxedTransport {
    fn build(&self, _settings: &Settings) -> ApaResult<BoxedTransport> {
        Ok(Arc::clone(self))
    }
}

/// Validates API keys and records the outcome
pub struct CredentialValidator {
    factory: Arc<dyn TransportFactory>,
}

impl CredentialValidator {
    pub fn new(factory: Arc<dyn TransportFactory>) -> Self {
        Self { factory }
    }

    /// Validator talking to MWS for the storefront's region
    pub fn for_mws(storefront: Arc<dyn Storefront>) -> Self {
        Self::new(Arc::new(MwsClientFactory::new(storefront)))
    }

    /// Validate the stored keys now
    pub async fn validate_api_keys(
        &self,
        store: &dyn SettingsStore,
        notices: &dyn AdminNotices,
    ) -> ValidationOutcome {
        self.validate_api_keys_at(store, notices, Utc::now()).await
    }

    /// Validate the stored keys, reporting clock problems relative to `now`
    #[instrument(skip_all)]
    pub async fn validate_api_keys_at(
        &self,
        store: &dyn SettingsStore,
        notices: &dyn AdminNotices,
        now: DateTime<Utc>,
    ) -> ValidationOutcome {
        let settings = Settings::load(store);

        // Fail closed: unchecked keys never read as validated
        record_flag(store, false);

        if settings.mws_access_key.is_empty() {
            info!("No MWS access key configured, skipping credential check");
            return ValidationOutcome::failed(None);
        }

        match self.check_credentials(store, &settings, now).await {
            Ok(()) => {
                if !record_flag(store, true) {
                    let message = FLAG_WRITE_FAILED_MESSAGE.to_string();
                    notices.add_error(&message);
                    return ValidationOutcome::failed(Some(message));
                }
                info!(
                    "MWS keys validated: access_key={}",
                    settings.masked_access_key()
                );
                notices.add_info(KEYS_VALIDATED_MESSAGE);
                ValidationOutcome::validated()
            }
            Err(e) => {
                warn!(
                    "MWS key validation failed: access_key={}, error={}",
                    settings.masked_access_key(),
                    e
                );
                let message = operator_message(&e);
                notices.add_error(&message);
                ValidationOutcome::failed(Some(message))
            }
        }
    }

    /// One round trip with the sentinel reference id
    async fn check_credentials(
        &self,
        store: &dyn SettingsStore,
        settings: &Settings,
        now: DateTime<Utc>,
    ) -> ApaResult<()> {
        if settings.secret_key.is_empty() {
            return Err(ApaError::CredentialValidation(
                MISSING_SECRET_KEY_MESSAGE.to_string(),
            ));
        }

        let transport = self.factory.build(settings)?;
        debug!(
            "Checking {} credentials: access_key={}",
            transport.provider_name(),
            settings.masked_access_key()
        );
        let request = ApiRequest::new(PING_ACTION)
            .param("AmazonOrderReferenceId", PING_ORDER_REFERENCE_ID);

        let response = transport.request(&request).await?;

        match response.error_code() {
            None | Some(EXPECTED_PING_ERROR) => Ok(()),
            Some(REQUEST_EXPIRED) => {
                let current_time = DateTimeSettings::load(store).format(now);
                Err(ApaError::CredentialValidation(request_expired_message(
                    &current_time,
                )))
            }
            Some(_) => Err(ApaError::CredentialValidation(
                INVALID_KEYS_MESSAGE.to_string(),
            )),
        }
    }
}

/// Persist the flag; returns whether the write succeeded
fn record_flag(store: &dyn SettingsStore, validated: bool) -> bool {
    let value = if validated { "1" } else { "0" };
    match store.update_option(keys::KEYS_VALIDATED, value) {
        Ok(()) => true,
        Err(e) => {
            error!("Failed to record {}={}: {}", keys::KEYS_VALIDATED, value, e);
            false
        }
    }
}

/// Message for the operator. Transport and provider failures are reported
/// the same way as rejected keys.
fn operator_message(err: &ApaError) -> String {
    match err {
        ApaError::CredentialValidation(message) => message.clone(),
        ApaError::Configuration(_) | ApaError::UnknownRegion { .. } => format!("Error: {}", err),
        _ => INVALID_KEYS_MESSAGE.to_string(),
    }
}
