//! Realtime adapters for keeping the query cache in sync with the server.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Socket.IO server  (/jobs)                         │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ websocket, else long-polling
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      FallbackTransport                               │
//! │   WebSocketTransport ──fails──► PollingTransport                    │
//! │   - Engine.IO handshake, bearer auth, namespace CONNECT             │
//! │   - Heartbeats and liveness stay inside the transport task          │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ ChannelFrame
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    RealtimeCacheBridge                               │
//! │   - One session task at a time                                      │
//! │   - SessionGate orders invalidation against teardown                │
//! │   - CacheInvalidator: JobEvent → invalidation plan                  │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ invalidate(prefix)
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         QueryCache                                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`protocol`] - Engine.IO / Socket.IO text codec
//! - [`session`] - Packet interpretation shared by both transports
//! - [`websocket`], [`polling`] - The two transports
//! - [`fallback`] - Ordered transport selection
//! - [`invalidator`] - Event decoding and cache invalidation
//! - [`bridge`] - Session lifecycle and connection state

pub mod bridge;
pub mod endpoint;
pub mod fallback;
pub mod gate;
pub mod invalidator;
pub mod polling;
pub mod protocol;
pub mod session;
pub mod websocket;

pub use bridge::{RealtimeCacheBridge, DEFAULT_HANDSHAKE_TIMEOUT};
pub use fallback::FallbackTransport;
pub use gate::SessionGate;
pub use invalidator::{BridgeStats, CacheInvalidator, HandleOutcome};
pub use polling::PollingTransport;
pub use protocol::{EnginePacket, OpenHandshake, ProtocolError, SocketPacket};
pub use websocket::WebSocketTransport;
