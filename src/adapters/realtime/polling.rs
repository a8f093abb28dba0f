//! HTTP long-polling transport for the push channel.
//!
//! Used when the websocket transport cannot be established. Each GET
//! returns a batch of Engine.IO packets separated by the record separator;
//! client packets are sent with POST to the same session URL.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

use crate::domain::foundation::ConnectionId;
use crate::domain::realtime::{BearerToken, TransportKind};
use crate::ports::{ChannelFrame, ChannelRequest, PushChannel, PushTransport, TransportError};

use super::endpoint::engine_url;
use super::protocol::{decode_payload, encode_payload, EnginePacket, ProtocolError, SocketPacket};
use super::session::{NamespaceSession, Step};

const DEFAULT_FRAME_BUFFER: usize = 64;

/// Long-polling [`PushTransport`].
#[derive(Debug, Clone)]
pub struct PollingTransport {
    client: reqwest::Client,
    frame_buffer: usize,
}

impl PollingTransport {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Use an existing HTTP client (shared connection pool, proxies).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            frame_buffer: DEFAULT_FRAME_BUFFER,
        }
    }

    async fn establish(&self, request: &ChannelRequest) -> Result<PushChannel, TransportError> {
        let handshake_url = engine_url(&request.endpoint, TransportKind::Polling, None)?;
        let http = PollingHttp {
            client: self.client.clone(),
            token: request.token.clone(),
        };

        let mut packets = http.get(handshake_url).await?.into_iter();
        let handshake = match packets.next() {
            Some(Ok(EnginePacket::Open(handshake))) => handshake,
            other => {
                return Err(TransportError::Handshake(format!(
                    "expected open packet, got {:?}",
                    other
                )))
            }
        };

        let session_url = engine_url(&request.endpoint, TransportKind::Polling, Some(&handshake.sid))?;
        let session = NamespaceSession::new(request.endpoint.namespace.clone());

        http.post(
            session_url.clone(),
            &[EnginePacket::Message(
                SocketPacket::connect(session.namespace(), &request.token).encode(),
            )],
        )
        .await?;

        // Anything that arrives in the same batch as the CONNECT ack is kept
        let mut early_frames = Vec::new();
        let mut connected = false;
        let mut pending: Vec<Result<EnginePacket, ProtocolError>> = packets.collect();

        while !connected {
            if pending.is_empty() {
                pending = http.get(session_url.clone()).await?;
            }

            let mut replies = Vec::new();
            for packet in pending.drain(..) {
                let step = match packet.and_then(|packet| session.on_packet(packet)) {
                    Ok(step) => step,
                    Err(e) => {
                        tracing::warn!(
                            connection_id = %request.connection_id,
                            error = %e,
                            "Dropping malformed packet"
                        );
                        continue;
                    }
                };
                match step {
                    Step::Connected => connected = true,
                    Step::Rejected(message) => return Err(TransportError::Rejected(message)),
                    Step::Closed(reason) => return Err(TransportError::Handshake(reason)),
                    Step::Reply(reply) => replies.push(reply),
                    Step::Deliver(frame) if connected => early_frames.push(frame),
                    Step::Deliver(_) | Step::Ignore => {}
                }
            }
            if !replies.is_empty() {
                http.post(session_url.clone(), &replies).await?;
            }
        }

        tracing::debug!(
            connection_id = %request.connection_id,
            sid = %handshake.sid,
            namespace = %session.namespace(),
            "Polling namespace joined"
        );

        let (frames_tx, frames_rx) = mpsc::channel(self.frame_buffer.max(early_frames.len() + 1));
        for frame in early_frames {
            // Capacity covers the early frames
            let _ = frames_tx.try_send(frame);
        }
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(poll_loop(
            http,
            session_url,
            session,
            handshake.liveness_window(),
            frames_tx,
            shutdown_rx,
            request.connection_id,
        ));

        Ok(PushChannel::new(TransportKind::Polling, frames_rx, shutdown_tx))
    }
}

impl Default for PollingTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PushTransport for PollingTransport {
    async fn open(&self, request: &ChannelRequest) -> Result<PushChannel, TransportError> {
        timeout(request.handshake_timeout, self.establish(request))
            .await
            .map_err(|_| TransportError::Timeout("polling handshake".to_string()))?
    }

    fn name(&self) -> &'static str {
        "polling"
    }
}

/// Authenticated GET/POST against the Engine.IO polling endpoint.
struct PollingHttp {
    client: reqwest::Client,
    token: BearerToken,
}

impl PollingHttp {
    async fn get(
        &self,
        url: Url,
    ) -> Result<Vec<Result<EnginePacket, ProtocolError>>, TransportError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(self.token.expose())
            .send()
            .await
            .map_err(|e| TransportError::Connect(format!("poll request failed: {}", e)))?;
        let response = check_status(response)?;

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Connect(format!("poll body failed: {}", e)))?;

        Ok(decode_payload(&body))
    }

    async fn post(&self, url: Url, packets: &[EnginePacket]) -> Result<(), TransportError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(self.token.expose())
            .header(reqwest::header::CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(encode_payload(packets))
            .send()
            .await
            .map_err(|e| TransportError::Connect(format!("post failed: {}", e)))?;
        check_status(response)?;
        Ok(())
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(TransportError::Rejected(format!("HTTP {}", status)));
    }
    if !status.is_success() {
        return Err(TransportError::Connect(format!("HTTP {}", status)));
    }
    Ok(response)
}

/// Keep polling until shutdown or until the session dies.
async fn poll_loop(
    http: PollingHttp,
    url: Url,
    session: NamespaceSession,
    liveness: Duration,
    frames: mpsc::Sender<ChannelFrame>,
    mut shutdown: oneshot::Receiver<()>,
    connection_id: ConnectionId,
) {
    let reason = 'outer: loop {
        let packets = tokio::select! {
            _ = &mut shutdown => {
                let goodbye = [session.disconnect_packet(), EnginePacket::Close];
                let _ = http.post(url.clone(), &goodbye).await;
                tracing::debug!(connection_id = %connection_id, "Polling session closed by client");
                return;
            }
            polled = timeout(liveness, http.get(url.clone())) => match polled {
                Err(_) => break "ping timeout".to_string(),
                Ok(Err(e)) => break e.to_string(),
                Ok(Ok(packets)) => packets,
            },
        };

        let mut replies = Vec::new();
        for packet in packets {
            match packet.and_then(|packet| session.on_packet(packet)) {
                Ok(Step::Reply(reply)) => replies.push(reply),
                Ok(Step::Deliver(frame)) => {
                    if frames.send(frame).await.is_err() {
                        return;
                    }
                }
                Ok(Step::Closed(reason)) => break 'outer reason,
                Ok(Step::Rejected(message)) => break 'outer format!("rejected: {}", message),
                Ok(Step::Connected) | Ok(Step::Ignore) => {}
                Err(e) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        error = %e,
                        "Dropping malformed packet"
                    );
                }
            }
        }

        if !replies.is_empty() {
            if let Err(e) = http.post(url.clone(), &replies).await {
                break e.to_string();
            }
        }
    };

    tracing::debug!(connection_id = %connection_id, reason = %reason, "Polling channel ended");
    let _ = frames.send(ChannelFrame::Closed { reason }).await;
}

