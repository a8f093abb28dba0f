//! Push channel configuration

use serde::Deserialize;
use std::time::Duration;

use crate::domain::realtime::TransportKind;
use crate::ports::ChannelEndpoint;

use super::environment::Environment;
use super::error::ValidationError;

/// Where and how to open the push channel
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// API base address, e.g. `https://api.example.com`
    pub api_base_url: String,

    /// Engine path appended to the base address
    #[serde(default = "default_socket_path")]
    pub socket_path: String,

    /// Socket.IO namespace carrying job events
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Transports to try, in order (comma-separated)
    #[serde(default = "default_transports")]
    pub transports: String,

    /// Upper bound for establishing the channel
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,
}

impl RealtimeConfig {
    /// Parsed transport order
    pub fn transport_order(&self) -> Result<Vec<TransportKind>, ValidationError> {
        TransportKind::parse_order(&self.transports)
            .map_err(|e| ValidationError::InvalidTransports(e.to_string()))
    }

    pub fn endpoint(&self) -> ChannelEndpoint {
        ChannelEndpoint {
            api_base_url: self.api_base_url.clone(),
            socket_path: self.socket_path.clone(),
            namespace: self.namespace.clone(),
        }
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    /// Validate push channel configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("realtime.api_base_url"));
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(ValidationError::InvalidApiBaseUrl);
        }
        if environment.is_production() && !self.api_base_url.starts_with("https://") {
            return Err(ValidationError::ApiBaseUrlMustBeHttps);
        }
        if !self.namespace.starts_with('/') {
            return Err(ValidationError::InvalidNamespace);
        }
        if self.socket_path.trim().is_empty() {
            return Err(ValidationError::MissingRequired("realtime.socket_path"));
        }
        self.transport_order()?;
        if self.handshake_timeout_secs == 0 || self.handshake_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn default_socket_path() -> String {
    "/socket.io/".to_string()
}

fn default_namespace() -> String {
    "/jobs".to_string()
}

fn default_transports() -> String {
    "websocket,polling".to_string()
}

fn default_handshake_timeout() -> u64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> RealtimeConfig {
        RealtimeConfig {
            api_base_url: "https://api.example.com".to_string(),
            socket_path: default_socket_path(),
            namespace: default_namespace(),
            transports: default_transports(),
            handshake_timeout_secs: default_handshake_timeout(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate(&Environment::Production).is_ok());
    }

    #[test]
    fn test_default_transport_order() {
        assert_eq!(
            valid_config().transport_order().unwrap(),
            vec![TransportKind::WebSocket, TransportKind::Polling]
        );
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = RealtimeConfig {
            api_base_url: "ftp://api.example.com".to_string(),
            ..valid_config()
        };
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::InvalidApiBaseUrl)
        );
    }

    #[test]
    fn test_http_allowed_outside_production() {
        let config = RealtimeConfig {
            api_base_url: "http://localhost:5000".to_string(),
            ..valid_config()
        };
        assert!(config.validate(&Environment::Development).is_ok());
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::ApiBaseUrlMustBeHttps)
        );
    }

    #[test]
    fn test_namespace_must_be_absolute() {
        let config = RealtimeConfig {
            namespace: "jobs".to_string(),
            ..valid_config()
        };
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::InvalidNamespace)
        );
    }

    #[test]
    fn test_unknown_transport_rejected() {
        let config = RealtimeConfig {
            transports: "websocket,carrier-pigeon".to_string(),
            ..valid_config()
        };
        assert!(matches!(
            config.validate(&Environment::Development),
            Err(ValidationError::InvalidTransports(_))
        ));
    }

    #[test]
    fn test_timeout_bounds() {
        for secs in [0, 301] {
            let config = RealtimeConfig {
                handshake_timeout_secs: secs,
                ..valid_config()
            };
            assert_eq!(
                config.validate(&Environment::Development),
                Err(ValidationError::InvalidTimeout)
            );
        }
    }

    #[test]
    fn test_endpoint_copies_fields() {
        let endpoint = valid_config().endpoint();
        assert_eq!(endpoint.api_base_url, "https://api.example.com");
        assert_eq!(endpoint.socket_path, "/socket.io/");
        assert_eq!(endpoint.namespace, "/jobs");
    }
}
