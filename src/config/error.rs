//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("API base URL must start with http:// or https://")]
    InvalidApiBaseUrl,

    #[error("API base URL must use HTTPS in production")]
    ApiBaseUrlMustBeHttps,

    #[error("Namespace must start with '/'")]
    InvalidNamespace,

    #[error("Invalid transport list: {0}")]
    InvalidTransports(String),

    #[error("Handshake timeout must be between 1 and 300 seconds")]
    InvalidTimeout,
}
