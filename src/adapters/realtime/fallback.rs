//! Ordered transport fallback.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::realtime::TransportKind;
use crate::ports::{ChannelRequest, PushChannel, PushTransport, TransportError};

use super::polling::PollingTransport;
use super::websocket::WebSocketTransport;

/// Tries each transport in order until one opens.
///
/// An authentication rejection stops the sequence: another transport would
/// present the same credential to the same server.
pub struct FallbackTransport {
    transports: Vec<Arc<dyn PushTransport>>,
}

impl FallbackTransport {
    pub fn new(transports: Vec<Arc<dyn PushTransport>>) -> Self {
        Self { transports }
    }

    /// Build the real transports in the configured order.
    pub fn from_order(order: &[TransportKind]) -> Self {
        let transports = order
            .iter()
            .map(|kind| -> Arc<dyn PushTransport> {
                match kind {
                    TransportKind::WebSocket => Arc::new(WebSocketTransport::new()),
                    TransportKind::Polling => Arc::new(PollingTransport::new()),
                }
            })
            .collect();
        Self::new(transports)
    }

    pub fn len(&self) -> usize {
        self.transports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transports.is_empty()
    }
}

#[async_trait]
impl PushTransport for FallbackTransport {
    async fn open(&self, request: &ChannelRequest) -> Result<PushChannel, TransportError> {
        let mut last_error = TransportError::NoTransports;

        for transport in &self.transports {
            match transport.open(request).await {
                Ok(channel) => {
                    tracing::info!(
                        connection_id = %request.connection_id,
                        transport = transport.name(),
                        "Push channel open"
                    );
                    return Ok(channel);
                }
                Err(TransportError::Rejected(message)) => {
                    return Err(TransportError::Rejected(message));
                }
                Err(e) => {
                    tracing::warn!(
                        connection_id = %request.connection_id,
                        transport = transport.name(),
                        error = %e,
                        "Transport failed, trying next"
                    );
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}
