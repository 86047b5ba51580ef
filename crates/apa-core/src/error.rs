//! # Gateway Error Types
//!
//! Typed error handling for the hosted-widgets gateway.
//! Fallible operations return `Result<T, ApaError>`.

use thiserror::Error;

/// Core error type for gateway operations
#[derive(Debug, Error)]
pub enum ApaError {
    /// Configuration errors (missing keys, invalid settings)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Stored payment region has no widget URL
    #[error("Configuration error: no widget URL for payment region '{region}'")]
    UnknownRegion { region: String },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// API credentials were rejected or could not be checked
    #[error("{0}")]
    CredentialValidation(String),

    /// Network/HTTP error communicating with the provider
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider answered with a malformed or unexpected response
    #[error("Provider error [{code}]: {message}")]
    Provider { code: String, message: String },

    /// Settings store could not be read or written
    #[error("Settings store error: {0}")]
    SettingsStore(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApaError {
    /// Returns true if the provider could not be reached at all
    pub fn is_transport(&self) -> bool {
        matches!(self, ApaError::Transport(_))
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ApaError::Configuration(_) => 500,
            ApaError::UnknownRegion { .. } => 500,
            ApaError::InvalidRequest(_) => 400,
            ApaError::CredentialValidation(_) => 422,
            ApaError::Transport(_) => 503,
            ApaError::Provider { .. } => 502,
            ApaError::SettingsStore(_) => 500,
            ApaError::Serialization(_) => 500,
            ApaError::Internal(_) => 500,
        }
    }
}

/// Result type alias for gateway operations
pub type ApaResult<T> = Result<T, ApaError>;
