//! Logging configuration

use serde::Deserialize;

/// Log output settings
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Filter directive, overridden by `RUST_LOG` when set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Log line format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single line
    #[default]
    Compact,
    /// One JSON object per line
    Json,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info,talent_realtime=debug".to_string()
}
