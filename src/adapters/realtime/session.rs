//! Transport-independent interpretation of incoming packets.
//!
//! Both the websocket and the polling transport feed decoded Engine.IO
//! packets through [`NamespaceSession::on_packet`] and act on the returned
//! [`Step`]. Keeping this in one place means the two transports cannot
//! disagree about heartbeats, namespace filtering, or what closes a channel.

use serde_json::Value;

use crate::ports::ChannelFrame;

use super::protocol::{EnginePacket, ProtocolError, SocketPacket};

/// What a transport should do after receiving a packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Send this packet back to the server.
    Reply(EnginePacket),
    /// Hand this frame to the bridge.
    Deliver(ChannelFrame),
    /// Namespace CONNECT acknowledged.
    Connected,
    /// Namespace CONNECT refused.
    Rejected(String),
    /// The channel is over.
    Closed(String),
    /// Nothing to do.
    Ignore,
}

/// Per-connection packet interpreter bound to one namespace.
#[derive(Debug, Clone)]
pub struct NamespaceSession {
    namespace: String,
}

impl NamespaceSession {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Packet that leaves the namespace, sent best effort on shutdown.
    pub fn disconnect_packet(&self) -> EnginePacket {
        EnginePacket::Message(
            SocketPacket::Disconnect {
                namespace: self.namespace.clone(),
            }
            .encode(),
        )
    }

    /// Interpret one Engine.IO packet.
    ///
    /// # Errors
    /// Returns `ProtocolError` when a message carries an undecodable
    /// Socket.IO packet. Callers drop the packet and keep going.
    pub fn on_packet(&self, packet: EnginePacket) -> Result<Step, ProtocolError> {
        let body = match packet {
            EnginePacket::Ping(data) => return Ok(Step::Reply(EnginePacket::Pong(data))),
            EnginePacket::Close => return Ok(Step::Closed("server closed transport".to_string())),
            EnginePacket::Message(body) => body,
            EnginePacket::Open(_)
            | EnginePacket::Pong(_)
            | EnginePacket::Upgrade
            | EnginePacket::Noop => return Ok(Step::Ignore),
        };

        let packet = SocketPacket::decode(&body)?;
        if packet.namespace() != self.namespace {
            return Ok(Step::Ignore);
        }

        let step = match packet {
            SocketPacket::Connect { .. } => Step::Connected,
            SocketPacket::ConnectError { message, .. } => Step::Rejected(message),
            SocketPacket::Disconnect { .. } => {
                Step::Closed("server disconnected namespace".to_string())
            }
            SocketPacket::Event { name, args, .. } => Step::Deliver(ChannelFrame::Event {
                name,
                payload: args.into_iter().next().unwrap_or(Value::Null),
            }),
            SocketPacket::Ack { .. } => Step::Ignore,
        };

        Ok(step)
    }
}
