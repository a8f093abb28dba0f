//! Websocket transport for the push channel.
//!
//! Connects straight to the Engine.IO websocket endpoint (no polling
//! upgrade dance), authenticates, joins the namespace, and then runs a pump
//! task that owns the socket until the channel is closed.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, AUTHORIZATION};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::domain::foundation::ConnectionId;
use crate::domain::realtime::TransportKind;
use crate::ports::{ChannelFrame, ChannelRequest, PushChannel, PushTransport, TransportError};

use super::endpoint::engine_url;
use super::protocol::{EnginePacket, SocketPacket};
use super::session::{NamespaceSession, Step};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default number of frames buffered between the socket and the bridge.
const DEFAULT_FRAME_BUFFER: usize = 64;

/// Websocket-based [`PushTransport`].
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    frame_buffer: usize,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self {
            frame_buffer: DEFAULT_FRAME_BUFFER,
        }
    }

    async fn establish(&self, request: &ChannelRequest) -> Result<PushChannel, TransportError> {
        let url = engine_url(&request.endpoint, TransportKind::WebSocket, None)?;

        let mut ws_request = url
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        let auth = HeaderValue::from_str(&request.token.authorization_header()).map_err(|_| {
            TransportError::Handshake("credential is not a valid header value".to_string())
        })?;
        ws_request.headers_mut().insert(AUTHORIZATION, auth);

        let (mut stream, _response) = connect_async(ws_request)
            .await
            .map_err(|e| TransportError::Connect(format!("websocket connect failed: {}", e)))?;

        let handshake = match read_packet(&mut stream).await? {
            EnginePacket::Open(handshake) => handshake,
            other => {
                return Err(TransportError::Handshake(format!(
                    "expected open packet, got {:?}",
                    other
                )))
            }
        };

        let session = NamespaceSession::new(request.endpoint.namespace.clone());
        let connect = EnginePacket::Message(SocketPacket::connect(session.namespace(), &request.token).encode());
        send_packet(&mut stream, &connect).await?;

        loop {
            let packet = read_packet(&mut stream).await?;
            let step = session
                .on_packet(packet)
                .map_err(|e| TransportError::Protocol(e.to_string()))?;
            match step {
                Step::Connected => break,
                Step::Rejected(message) => return Err(TransportError::Rejected(message)),
                Step::Closed(reason) => return Err(TransportError::Handshake(reason)),
                Step::Reply(reply) => send_packet(&mut stream, &reply).await?,
                Step::Deliver(_) | Step::Ignore => {}
            }
        }

        tracing::debug!(
            connection_id = %request.connection_id,
            sid = %handshake.sid,
            namespace = %session.namespace(),
            "Websocket namespace joined"
        );

        let (frames_tx, frames_rx) = mpsc::channel(self.frame_buffer);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(pump(
            stream,
            session,
            handshake.liveness_window(),
            frames_tx,
            shutdown_rx,
            request.connection_id,
        ));

        Ok(PushChannel::new(TransportKind::WebSocket, frames_rx, shutdown_tx))
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PushTransport for WebSocketTransport {
    async fn open(&self, request: &ChannelRequest) -> Result<PushChannel, TransportError> {
        timeout(request.handshake_timeout, self.establish(request))
            .await
            .map_err(|_| TransportError::Timeout("websocket handshake".to_string()))?
    }

    fn name(&self) -> &'static str {
        "websocket"
    }
}

/// Read the next Engine.IO packet during the handshake.
async fn read_packet(stream: &mut WsStream) -> Result<EnginePacket, TransportError> {
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                return EnginePacket::decode(&text)
                    .map_err(|e| TransportError::Protocol(e.to_string()))
            }
            Some(Ok(Message::Close(_))) => {
                return Err(TransportError::Handshake(
                    "server closed websocket during handshake".to_string(),
                ))
            }
            // Websocket-level ping/pong is answered by tungstenite
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(TransportError::Connect(e.to_string())),
            None => {
                return Err(TransportError::Connect(
                    "websocket ended during handshake".to_string(),
                ))
            }
        }
    }
}

async fn send_packet(stream: &mut WsStream, packet: &EnginePacket) -> Result<(), TransportError> {
    stream
        .send(Message::Text(packet.encode()))
        .await
        .map_err(|e| TransportError::Connect(format!("websocket send failed: {}", e)))
}

/// Own the socket for the lifetime of the channel.
///
/// Exits when the bridge asks for shutdown, when the bridge drops its
/// receiver, or when the connection ends. In the last case a
/// `ChannelFrame::Closed` is sent first.
async fn pump(
    mut stream: WsStream,
    session: NamespaceSession,
    liveness: Duration,
    frames: mpsc::Sender<ChannelFrame>,
    mut shutdown: oneshot::Receiver<()>,
    connection_id: ConnectionId,
) {
    let reason = loop {
        tokio::select! {
            _ = &mut shutdown => {
                let _ = send_packet(&mut stream, &session.disconnect_packet()).await;
                let _ = stream.close(None).await;
                tracing::debug!(connection_id = %connection_id, "Websocket closed by client");
                return;
            }
            next = timeout(liveness, stream.next()) => {
                let message = match next {
                    Err(_) => break "ping timeout".to_string(),
                    Ok(None) => break "websocket ended".to_string(),
                    Ok(Some(Err(e))) => break format!("websocket error: {}", e),
                    Ok(Some(Ok(message))) => message,
                };

                let text = match message {
                    Message::Text(text) => text,
                    Message::Close(_) => break "server closed websocket".to_string(),
                    Message::Binary(_) => {
                        tracing::warn!(connection_id = %connection_id, "Ignoring binary websocket message");
                        continue;
                    }
                    _ => continue,
                };

                let step = EnginePacket::decode(&text).and_then(|packet| session.on_packet(packet));
                match step {
                    Ok(Step::Reply(reply)) => {
                        if let Err(e) = send_packet(&mut stream, &reply).await {
                            break e.to_string();
                        }
                    }
                    Ok(Step::Deliver(frame)) => {
                        if frames.send(frame).await.is_err() {
                            // Bridge dropped the channel
                            return;
                        }
                    }
                    Ok(Step::Closed(reason)) => break reason,
                    Ok(Step::Rejected(message)) => break format!("rejected: {}", message),
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
        }
    };

    tracing::debug!(connection_id = %connection_id, reason = %reason, "Websocket channel ended");
    let _ = frames.send(ChannelFrame::Closed { reason }).await;
}
