//! Connection lifecycle and transport selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Lifecycle of the push-channel connection.
///
/// ```text
/// Disconnected ──► Connecting ──► Connected
///      ▲              │   │           │
///      │              │   ▼           │
///      │              │  Error        │
///      │              ▼   │           │
///      └──────────────┴───┴───────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionState {
    /// True only while the channel is established.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Error => "error",
        }
    }
}

impl StateMachine for ConnectionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConnectionState::*;
        matches!(
            (self, target),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Error)
                | (Connecting, Disconnected)
                | (Connected, Disconnected)
                | (Error, Disconnected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionState::*;
        match self {
            Disconnected => vec![Connecting],
            Connecting => vec![Connected, Error, Disconnected],
            Connected => vec![Disconnected],
            Error => vec![Disconnected],
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire transport used to carry the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Full-duplex websocket.
    WebSocket,
    /// HTTP long-polling.
    Polling,
}

impl TransportKind {
    /// Default preference: streaming socket first, polling fallback.
    pub const DEFAULT_ORDER: [TransportKind; 2] = [TransportKind::WebSocket, TransportKind::Polling];

    /// Engine.IO `transport` query value.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::WebSocket => "websocket",
            TransportKind::Polling => "polling",
        }
    }

    /// Parses a comma-separated preference list such as `"websocket,polling"`.
    ///
    /// Duplicates are dropped, keeping the first occurrence.
    pub fn parse_order(list: &str) -> Result<Vec<TransportKind>, ValidationError> {
        let mut order = Vec::new();
        for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let kind: TransportKind = item.parse()?;
            if !order.contains(&kind) {
                order.push(kind);
            }
        }
        if order.is_empty() {
            return Err(ValidationError::empty_field("transports"));
        }
        Ok(order)
    }
}

impl FromStr for TransportKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "websocket" => Ok(TransportKind::WebSocket),
            "polling" => Ok(TransportKind::Polling),
            other => Err(ValidationError::invalid_format(
                "transports",
                format!("unknown transport '{}'", other),
            )),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_valid() {
        let state = ConnectionState::Disconnected;
        let state = state.transition_to(ConnectionState::Connecting).unwrap();
        let state = state.transition_to(ConnectionState::Connected).unwrap();
        let state = state.transition_to(ConnectionState::Disconnected).unwrap();
        assert_eq!(state, ConnectionState::Disconnected);
    }

    #[test]
    fn failure_path_goes_through_error() {
        let state = ConnectionState::Connecting
            .transition_to(ConnectionState::Error)
            .unwrap();
        assert_eq!(
            state.transition_to(ConnectionState::Disconnected),
            Ok(ConnectionState::Disconnected)
        );
    }

    #[test]
    fn cannot_skip_connecting() {
        assert!(ConnectionState::Disconnected
            .transition_to(ConnectionState::Connected)
            .is_err());
        assert!(ConnectionState::Error
            .transition_to(ConnectionState::Connecting)
            .is_err());
    }

    #[test]
    fn disconnected_to_disconnected_is_not_a_transition() {
        assert!(!ConnectionState::Disconnected.can_transition_to(&ConnectionState::Disconnected));
    }

    #[test]
    fn can_transition_to_agrees_with_valid_transitions() {
        use ConnectionState::*;
        for from in [Disconnected, Connecting, Connected, Error] {
            for to in [Disconnected, Connecting, Connected, Error] {
                assert_eq!(
                    from.can_transition_to(&to),
                    from.valid_transitions().contains(&to),
                    "{:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn only_connected_reports_connected() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());
        assert!(!ConnectionState::Error.is_connected());
    }

    #[test]
    fn parses_default_order() {
        assert_eq!(
            TransportKind::parse_order("websocket, polling").unwrap(),
            TransportKind::DEFAULT_ORDER.to_vec()
        );
    }

    #[test]
    fn parse_order_drops_duplicates() {
        assert_eq!(
            TransportKind::parse_order("polling,POLLING,websocket").unwrap(),
            vec![TransportKind::Polling, TransportKind::WebSocket]
        );
    }

    #[test]
    fn parse_order_rejects_unknown_and_empty() {
        assert!(TransportKind::parse_order("webtransport").is_err());
        assert!(TransportKind::parse_order(" , ").is_err());
    }
}
