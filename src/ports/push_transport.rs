//! PushTransport port - Interface for opening the server-push channel.
//!
//! A transport performs the whole establishment handshake (including
//! authentication and joining the namespace) inside [`PushTransport::open`].
//! Once it returns a [`PushChannel`], the bridge only ever reads frames from
//! it; heartbeats and protocol housekeeping stay inside the transport.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use crate::domain::foundation::ConnectionId;
use crate::domain::realtime::{BearerToken, TransportKind};

/// Where the push channel lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEndpoint {
    /// API base address, e.g. `https://api.example.com`.
    pub api_base_url: String,
    /// Engine path under the base address, e.g. `/socket.io/`.
    pub socket_path: String,
    /// Logical channel, e.g. `/jobs`.
    pub namespace: String,
}

/// Everything a transport needs to establish one connection.
#[derive(Debug, Clone)]
pub struct ChannelRequest {
    pub endpoint: ChannelEndpoint,
    pub token: BearerToken,
    pub connection_id: ConnectionId,
    /// Upper bound for the establishment handshake.
    pub handshake_timeout: Duration,
}

/// A frame delivered to the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelFrame {
    /// A named domain event and its first argument (`null` when absent).
    Event { name: String, payload: Value },
    /// The channel ended. No further frames follow.
    Closed { reason: String },
}

/// An established push channel.
///
/// Dropping the channel (or calling [`PushChannel::close`]) tells the
/// transport task to disconnect.
pub struct PushChannel {
    transport: TransportKind,
    frames: mpsc::Receiver<ChannelFrame>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl PushChannel {
    /// Wrap a transport's frame receiver and shutdown signal.
    pub fn new(
        transport: TransportKind,
        frames: mpsc::Receiver<ChannelFrame>,
        shutdown: oneshot::Sender<()>,
    ) -> Self {
        Self {
            transport,
            frames,
            shutdown: Some(shutdown),
        }
    }

    /// Transport that carries this channel.
    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    /// Wait for the next frame. `None` means the transport task is gone.
    pub async fn next_frame(&mut self) -> Option<ChannelFrame> {
        self.frames.recv().await
    }

    /// Ask the transport to disconnect. Idempotent.
    pub fn close(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            // Receiver gone means the transport already stopped
            let _ = shutdown.send(());
        }
    }
}

impl Drop for PushChannel {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for PushChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushChannel")
            .field("transport", &self.transport)
            .field("open", &self.shutdown.is_some())
            .finish()
    }
}

/// Errors that can occur while establishing the push channel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Server rejected connection: {0}")]
    Rejected(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("No transports configured")]
    NoTransports,
}

/// Port for opening an authenticated push channel.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Establish the channel: connect, authenticate, join the namespace.
    ///
    /// # Errors
    /// Returns `TransportError` if any establishment step fails. No retry
    /// is attempted.
    async fn open(&self, request: &ChannelRequest) -> Result<PushChannel, TransportError>;

    /// Transport name for logging.
    fn name(&self) -> &'static str;
}
