//! Engine.IO v4 / Socket.IO v5 text codec.
//!
//! Two layers are involved:
//!
//! ```text
//! Engine.IO packet   "4" + <socket.io packet>
//!                     │
//! Socket.IO packet   "2/jobs,[\"job-created\",{...}]"
//!                     │ │     └─ JSON data
//!                     │ └─ namespace (omitted for "/")
//!                     └─ packet type
//! ```
//!
//! Only the text encoding is supported. Binary attachments are rejected.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::domain::realtime::BearerToken;

/// Engine.IO protocol revision spoken by this client.
pub const ENGINE_IO_VERSION: &str = "4";

/// Separates packets inside one long-polling payload.
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Errors produced while decoding packets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Empty packet")]
    Empty,

    #[error("Unknown Engine.IO packet type '{0}'")]
    UnknownEngineType(char),

    #[error("Unknown Socket.IO packet type '{0}'")]
    UnknownSocketType(char),

    #[error("Binary packets are not supported")]
    BinaryUnsupported,

    #[error("Invalid open handshake: {0}")]
    InvalidHandshake(String),

    #[error("Invalid packet data: {0}")]
    InvalidData(String),
}

/// Parameters the server sends in the Engine.IO open packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenHandshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings.
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong.
    pub ping_timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload: Option<u64>,
}

impl OpenHandshake {
    /// How long the client may go without hearing from the server before
    /// considering the connection dead.
    pub fn liveness_window(&self) -> Duration {
        Duration::from_millis(self.ping_interval.saturating_add(self.ping_timeout))
    }
}

/// Engine.IO transport-level packet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenHandshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    /// Decode one packet.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        let mut chars = raw.chars();
        let kind = chars.next().ok_or(ProtocolError::Empty)?;
        let body = chars.as_str();

        match kind {
            '0' => serde_json::from_str(body)
                .map(EnginePacket::Open)
                .map_err(|e| ProtocolError::InvalidHandshake(e.to_string())),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(body.to_string())),
            '3' => Ok(EnginePacket::Pong(body.to_string())),
            '4' => Ok(EnginePacket::Message(body.to_string())),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            'b' => Err(ProtocolError::BinaryUnsupported),
            other => Err(ProtocolError::UnknownEngineType(other)),
        }
    }

    /// Encode one packet.
    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(handshake) => format!(
                "0{}",
                serde_json::to_string(handshake).expect("OpenHandshake serialization should not fail")
            ),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{}", data),
            EnginePacket::Pong(data) => format!("3{}", data),
            EnginePacket::Message(data) => format!("4{}", data),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

/// Split a long-polling payload into packets.
///
/// Each record decodes on its own, so one bad record does not cost the
/// rest of the batch.
pub fn decode_payload(body: &str) -> Vec<Result<EnginePacket, ProtocolError>> {
    body.split(RECORD_SEPARATOR)
        .filter(|record| !record.is_empty())
        .map(EnginePacket::decode)
        .collect()
}

/// Join packets into one long-polling payload.
pub fn encode_payload(packets: &[EnginePacket]) -> String {
    packets
        .iter()
        .map(EnginePacket::encode)
        .collect::<Vec<_>>()
        .join(&RECORD_SEPARATOR.to_string())
}

/// Socket.IO packet carried inside an Engine.IO message.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        ack_id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        ack_id: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        message: String,
    },
}

impl SocketPacket {
    /// CONNECT for `namespace`, carrying the bearer token as auth payload.
    pub fn connect(namespace: &str, token: &BearerToken) -> Self {
        SocketPacket::Connect {
            namespace: namespace.to_string(),
            data: Some(json!({ "token": token.expose() })),
        }
    }

    /// Namespace the packet belongs to.
    pub fn namespace(&self) -> &str {
        match self {
            SocketPacket::Connect { namespace, .. }
            | SocketPacket::Disconnect { namespace }
            | SocketPacket::Event { namespace, .. }
            | SocketPacket::Ack { namespace, .. }
            | SocketPacket::ConnectError { namespace, .. } => namespace,
        }
    }

    /// Decode the body of an Engine.IO message.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        let mut chars = raw.chars();
        let kind = chars.next().ok_or(ProtocolError::Empty)?;
        let rest = chars.as_str();

        let (namespace, rest) = if rest.starts_with('/') {
            match rest.find(',') {
                Some(idx) => (&rest[..idx], &rest[idx + 1..]),
                None => (rest, ""),
            }
        } else {
            ("/", rest)
        };
        let namespace = namespace.to_string();

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let ack_id = if digits > 0 {
            Some(
                rest[..digits]
                    .parse::<u64>()
                    .map_err(|e| ProtocolError::InvalidData(e.to_string()))?,
            )
        } else {
            None
        };
        let data = &rest[digits..];

        match kind {
            '0' => Ok(SocketPacket::Connect {
                namespace,
                data: parse_optional_json(data)?,
            }),
            '1' => Ok(SocketPacket::Disconnect { namespace }),
            '2' => {
                let mut args = parse_array(data)?;
                if args.is_empty() {
                    return Err(ProtocolError::InvalidData("event without a name".to_string()));
                }
                let name = match args.remove(0) {
                    Value::String(name) => name,
                    other => {
                        return Err(ProtocolError::InvalidData(format!(
                            "event name must be a string, got {}",
                            other
                        )))
                    }
                };
                Ok(SocketPacket::Event {
                    namespace,
                    ack_id,
                    name,
                    args,
                })
            }
            '3' => Ok(SocketPacket::Ack {
                namespace,
                ack_id: ack_id
                    .ok_or_else(|| ProtocolError::InvalidData("ack without id".to_string()))?,
                args: parse_array(data)?,
            }),
            '4' => {
                let message = match parse_optional_json(data)? {
                    Some(Value::String(message)) => message,
                    Some(Value::Object(fields)) => fields
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("connection refused")
                        .to_string(),
                    _ => "connection refused".to_string(),
                };
                Ok(SocketPacket::ConnectError { namespace, message })
            }
            '5' | '6' => Err(ProtocolError::BinaryUnsupported),
            other => Err(ProtocolError::UnknownSocketType(other)),
        }
    }

    /// Encode as the body of an Engine.IO message.
    pub fn encode(&self) -> String {
        let (kind, ack_id, data) = match self {
            SocketPacket::Connect { data, .. } => ('0', None, data.clone()),
            SocketPacket::Disconnect { .. } => ('1', None, None),
            SocketPacket::Event {
                ack_id, name, args, ..
            } => {
                let mut array = Vec::with_capacity(args.len() + 1);
                array.push(Value::String(name.clone()));
                array.extend(args.iter().cloned());
                ('2', *ack_id, Some(Value::Array(array)))
            }
            SocketPacket::Ack { ack_id, args, .. } => ('3', Some(*ack_id), Some(Value::Array(args.clone()))),
            SocketPacket::ConnectError { message, .. } => {
                ('4', None, Some(json!({ "message": message })))
            }
        };

        let mut out = String::new();
        out.push(kind);
        let namespace = self.namespace();
        if namespace != "/" {
            out.push_str(namespace);
            out.push(',');
        }
        if let Some(id) = ack_id {
            out.push_str(&id.to_string());
        }
        if let Some(data) = data {
            out.push_str(&data.to_string());
        }
        out
    }
}

fn parse_optional_json(data: &str) -> Result<Option<Value>, ProtocolError> {
    if data.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(data)
        .map(Some)
        .map_err(|e| ProtocolError::InvalidData(e.to_string()))
}

fn parse_array(data: &str) -> Result<Vec<Value>, ProtocolError> {
    match parse_optional_json(data)? {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(ProtocolError::InvalidData(format!(
            "expected array, got {}",
            other
        ))),
        None => Ok(Vec::new()),
    }
}
