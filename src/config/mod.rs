//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `TALENT_REALTIME` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use talent_realtime::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Push channel at {}", config.realtime.api_base_url);
//! ```

mod credentials;
mod environment;
mod error;
mod realtime;
mod telemetry;

pub use credentials::CredentialsConfig;
pub use environment::Environment;
pub use error::{ConfigError, ValidationError};
pub use realtime::RealtimeConfig;
pub use telemetry::{LogFormat, TelemetryConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Deployment environment
    #[serde(default)]
    pub environment: Environment,

    /// Push channel endpoint and transports
    pub realtime: RealtimeConfig,

    /// Where the bearer token is persisted
    pub credentials: CredentialsConfig,

    /// Logging
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `TALENT_REALTIME` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `TALENT_REALTIME__REALTIME__API_BASE_URL=...` -> `realtime.api_base_url = ...`
    /// - `TALENT_REALTIME__CREDENTIALS__ORIGIN=...` -> `credentials.origin = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TALENT_REALTIME")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.realtime.validate(&self.environment)?;
        self.credentials.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }
}
