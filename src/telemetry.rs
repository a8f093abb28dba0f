//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, TelemetryConfig};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured directive when set. Fails if a
/// global subscriber is already installed.
pub fn init_tracing(
    config: &TelemetryConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = env_filter(config);

    match config.log_format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .compact()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .try_init(),
    }
}

fn env_filter(config: &TelemetryConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}
