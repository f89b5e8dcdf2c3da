//! Error types for nexuschat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for nexuschat operations
///
/// Covers configuration loading, credential lookup, and the two backend
/// endpoints. Send and history failures are converted into chat state by
/// the controller; these variants mostly surface from the CLI.
#[derive(Error, Debug)]
pub enum NexusError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Non-success response from the backend
    ///
    /// `message` is the response body text, or the status reason when the
    /// body was empty.
    #[error("{message}")]
    Api {
        /// HTTP status code returned by the backend
        status: u16,
        /// Error text to show to the user
        message: String,
    },

    /// Authentication errors (401 Unauthorized, missing credential)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Credential provider failures other than "no credential"
    #[error("Credential error: {0}")]
    Credential(String),

    /// Malformed or unknown interactive command
    #[error("Command error: {0}")]
    Command(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type alias for nexuschat operations
///
/// Uses `anyhow::Error` so callers can attach context while still being
/// able to downcast to [`NexusError`].
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = NexusError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_api_error_display_is_body_text() {
        let error = NexusError::Api {
            status: 500,
            message: "model overloaded".to_string(),
        };
        assert_eq!(error.to_string(), "model overloaded");
    }

    #[test]
    fn test_authentication_error_display() {
        let error = NexusError::Authentication("token expired".to_string());
        assert_eq!(error.to_string(), "Authentication error: token expired");
    }

    #[test]
    fn test_credential_error_display() {
        let error = NexusError::Credential("locked".to_string());
        assert_eq!(error.to_string(), "Credential error: locked");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: NexusError = io_error.into();
        assert!(matches!(error, NexusError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: NexusError = json_error.into();
        assert!(matches!(error, NexusError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: NexusError = yaml_error.into();
        assert!(matches!(error, NexusError::Yaml(_)));
    }

    #[test]
    fn test_error_downcasts_through_anyhow() {
        let err: anyhow::Error = NexusError::Api {
            status: 404,
            message: "missing".to_string(),
        }
        .into();
        match err.downcast_ref::<NexusError>() {
            Some(NexusError::Api { status, .. }) => assert_eq!(*status, 404),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NexusError>();
    }
}
