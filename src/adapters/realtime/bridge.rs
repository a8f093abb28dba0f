//! Realtime cache-sync bridge.
//!
//! Owns at most one push-channel session at a time. Each session is a
//! spawned task that opens the channel, then feeds every event frame to the
//! shared [`CacheInvalidator`] in arrival order.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::foundation::{ConnectionId, StateMachine};
use crate::domain::realtime::{BearerToken, ConnectionState};
use crate::ports::{
    ChannelEndpoint, ChannelFrame, ChannelRequest, CredentialStore, PushTransport, QueryCache,
};

use super::gate::SessionGate;
use super::invalidator::{BridgeStats, CacheInvalidator};

/// Default bound for the establishment handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(20);

struct ActiveSession {
    connection_id: ConnectionId,
    gate: Arc<SessionGate>,
    task: JoinHandle<()>,
}

/// Keeps the query cache in step with server-side job changes.
///
/// `connect` and `disconnect` never block on I/O. Establishment failures,
/// malformed events, and server disconnects are logged, never returned.
pub struct RealtimeCacheBridge {
    transport: Arc<dyn PushTransport>,
    invalidator: Arc<CacheInvalidator>,
    endpoint: ChannelEndpoint,
    handshake_timeout: Duration,
    state: Arc<watch::Sender<ConnectionState>>,
    session: Mutex<Option<ActiveSession>>,
}

impl RealtimeCacheBridge {
    pub fn new(
        transport: Arc<dyn PushTransport>,
        cache: Arc<dyn QueryCache>,
        endpoint: ChannelEndpoint,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            transport,
            invalidator: Arc::new(CacheInvalidator::new(cache)),
            endpoint,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            state: Arc::new(state),
            session: Mutex::new(None),
        }
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Start a session with `credential`, replacing any current one.
    ///
    /// Without a credential this only tears down and stays disconnected.
    /// Must be called from within a Tokio runtime to actually connect.
    pub fn connect(&self, credential: Option<BearerToken>) {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = session.take() {
            self.teardown(previous);
        }
        transition(&self.state, ConnectionState::Disconnected);

        let Some(token) = credential else {
            tracing::debug!("No credential, realtime sync stays disconnected");
            return;
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!(error = %e, "No async runtime, cannot connect");
                return;
            }
        };

        let connection_id = ConnectionId::new();
        let gate = Arc::new(SessionGate::new());
        let request = ChannelRequest {
            endpoint: self.endpoint.clone(),
            token,
            connection_id,
            handshake_timeout: self.handshake_timeout,
        };

        transition(&self.state, ConnectionState::Connecting);
        tracing::debug!(
            connection_id = %connection_id,
            transport = self.transport.name(),
            "Connecting push channel"
        );

        let task = runtime.spawn(run_session(
            self.transport.clone(),
            self.invalidator.clone(),
            self.state.clone(),
            gate.clone(),
            request,
        ));

        *session = Some(ActiveSession {
            connection_id,
            gate,
            task,
        });
    }

    /// Read the credential once from `store` and connect with it.
    pub async fn connect_from_store(&self, store: &dyn CredentialStore) {
        let credential = match store.load_token().await {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read credential");
                None
            }
        };
        self.connect(credential);
    }

    /// Tear down the current session, if any. Idempotent.
    ///
    /// When this returns, the old session can no longer invalidate the
    /// cache or change the connection state.
    pub fn disconnect(&self) {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = session.take() {
            self.teardown(previous);
        }
        transition(&self.state, ConnectionState::Disconnected);
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Watch connection state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn stats(&self) -> BridgeStats {
        self.invalidator.stats()
    }

    fn teardown(&self, session: ActiveSession) {
        session.gate.close();
        // Dropping the task's channel signals the transport to disconnect
        session.task.abort();
        tracing::debug!(connection_id = %session.connection_id, "Session torn down");
    }
}

impl Drop for RealtimeCacheBridge {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl std::fmt::Debug for RealtimeCacheBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeCacheBridge")
            .field("transport", &self.transport.name())
            .field("endpoint", &self.endpoint)
            .field("state", &self.state())
            .finish()
    }
}

/// Apply a validated state change. Invalid transitions are ignored.
fn transition(state: &watch::Sender<ConnectionState>, target: ConnectionState) {
    state.send_if_modified(|current| {
        if *current == target {
            return false;
        }
        match current.transition_to(target) {
            Ok(next) => {
                *current = next;
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid state transition");
                false
            }
        }
    });
}

async fn run_session(
    transport: Arc<dyn PushTransport>,
    invalidator: Arc<CacheInvalidator>,
    state: Arc<watch::Sender<ConnectionState>>,
    gate: Arc<SessionGate>,
    request: ChannelRequest,
) {
    let connection_id = request.connection_id;

    let mut channel = match transport.open(&request).await {
        Ok(channel) => channel,
        Err(e) => {
            tracing::warn!(
                connection_id = %connection_id,
                transport = transport.name(),
                error = %e,
                "Push channel could not be established"
            );
            gate.run(|| {
                transition(&state, ConnectionState::Error);
                transition(&state, ConnectionState::Disconnected);
            });
            return;
        }
    };

    if gate
        .run(|| transition(&state, ConnectionState::Connected))
        .is_none()
    {
        return;
    }
    tracing::info!(
        connection_id = %connection_id,
        transport = channel.transport().as_str(),
        "Realtime cache sync connected"
    );

    while let Some(frame) = channel.next_frame().await {
        match frame {
            ChannelFrame::Event { name, payload } => {
                invalidator.handle(&name, &payload, &gate);
            }
            ChannelFrame::Closed { reason } => {
                tracing::info!(connection_id = %connection_id, reason = %reason, "Push channel closed");
                break;
            }
        }
    }

    gate.run(|| transition(&state, ConnectionState::Disconnected));
}
