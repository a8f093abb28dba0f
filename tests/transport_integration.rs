//! Integration tests for the websocket and polling transports.
//!
//! An in-process axum server plays the Socket.IO backend:
//! 1. Engine.IO open handshake over websocket or long-polling
//! 2. Namespace CONNECT with the bearer token as auth payload
//! 3. CONNECT ack (or CONNECT_ERROR), then scripted job events and a ping
//!
//! Each test wires the real transports into the bridge and checks the cache.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use talent_realtime::adapters::realtime::{
    FallbackTransport, PollingTransport, RealtimeCacheBridge, WebSocketTransport,
};
use talent_realtime::adapters::InMemoryQueryCache;
use talent_realtime::domain::foundation::JobId;
use talent_realtime::domain::realtime::{BearerToken, CacheKey, ConnectionState, TransportKind};
use talent_realtime::ports::{ChannelEndpoint, PushTransport};

// =============================================================================
// Test Infrastructure
// =============================================================================

const TOKEN: &str = "secret-token";
const HANDSHAKE: &str =
    r#"0{"sid":"engine-sid","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
const SEPARATOR: char = '\u{1e}';

/// Scripted Socket.IO backend.
#[derive(Default)]
struct Stub {
    reject_websocket: bool,
    connect_error: Option<String>,
    events: Vec<(String, Value)>,
    trailing_records: Vec<String>,
    authorizations: Mutex<Vec<String>>,
    transports: Mutex<Vec<String>>,
    connect_payloads: Mutex<Vec<Value>>,
    received: Mutex<Vec<String>>,
    outbound: Mutex<VecDeque<String>>,
}

impl Stub {
    fn with_events(events: Vec<(&str, Value)>) -> Self {
        Self {
            events: events
                .into_iter()
                .map(|(name, payload)| (name.to_string(), payload))
                .collect(),
            ..Default::default()
        }
    }

    fn authorizations(&self) -> Vec<String> {
        self.authorizations.lock().unwrap().clone()
    }

    fn transports(&self) -> Vec<String> {
        self.transports.lock().unwrap().clone()
    }

    fn connect_payloads(&self) -> Vec<Value> {
        self.connect_payloads.lock().unwrap().clone()
    }

    fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    /// Record a client packet; returns the server's answer for a CONNECT.
    fn on_client_packet(&self, packet: &str) -> Vec<String> {
        if let Some(auth) = packet.strip_prefix("40/jobs,") {
            let payload = serde_json::from_str(auth).unwrap_or(Value::Null);
            self.connect_payloads.lock().unwrap().push(payload);
            return self.after_connect();
        }
        self.received.lock().unwrap().push(packet.to_string());
        Vec::new()
    }

    fn after_connect(&self) -> Vec<String> {
        if let Some(message) = &self.connect_error {
            return vec![format!("44/jobs,{}", json!({ "message": message }))];
        }
        let mut packets = vec![r#"40/jobs,{"sid":"nsp-sid"}"#.to_string()];
        for (name, payload) in &self.events {
            packets.push(format!("42/jobs,{}", json!([name, payload])));
        }
        packets.extend(self.trailing_records.iter().cloned());
        packets.push("2".to_string());
        packets
    }

    fn record_request(&self, transport: &str, headers: &HeaderMap) {
        self.transports.lock().unwrap().push(transport.to_string());
        if let Some(auth) = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
        {
            self.authorizations.lock().unwrap().push(auth.to_string());
        }
    }
}

async fn engine_get(
    State(stub): State<Arc<Stub>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    ws: Option<WebSocketUpgrade>,
) -> Response {
    let transport = params.get("transport").cloned().unwrap_or_default();
    stub.record_request(&transport, &headers);

    if transport == "websocket" {
        if stub.reject_websocket {
            return StatusCode::BAD_REQUEST.into_response();
        }
        return match ws {
            Some(ws) => ws.on_upgrade(move |socket| websocket_session(socket, stub)),
            None => StatusCode::BAD_REQUEST.into_response(),
        };
    }

    if !params.contains_key("sid") {
        return HANDSHAKE.into_response();
    }

    // Long-poll: hold the request briefly, then answer with whatever is queued
    for _ in 0..20 {
        let batch: Vec<String> = stub.outbound.lock().unwrap().drain(..).collect();
        if !batch.is_empty() {
            return batch.join(&SEPARATOR.to_string()).into_response();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    "6".into_response()
}

async fn engine_post(
    State(stub): State<Arc<Stub>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let transport = params.get("transport").cloned().unwrap_or_default();
    stub.record_request(&transport, &headers);

    for packet in body.split(SEPARATOR).filter(|p| !p.is_empty()) {
        let replies = stub.on_client_packet(packet);
        stub.outbound.lock().unwrap().extend(replies);
    }
    "ok".into_response()
}

async fn websocket_session(mut socket: WebSocket, stub: Arc<Stub>) {
    if socket.send(Message::Text(HANDSHAKE.to_string())).await.is_err() {
        return;
    }
    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };
        for reply in stub.on_client_packet(&text) {
            if socket.send(Message::Text(reply)).await.is_err() {
                return;
            }
        }
    }
}

async fn spawn_stub(stub: Stub) -> (Arc<Stub>, String) {
    let stub = Arc::new(stub);
    let app = Router::new()
        .route("/socket.io/", get(engine_get).post(engine_post))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (stub, format!("http://{}", addr))
}

fn bridge_for(
    base_url: &str,
    transport: Arc<dyn PushTransport>,
) -> (RealtimeCacheBridge, Arc<InMemoryQueryCache>) {
    let cache = Arc::new(InMemoryQueryCache::new());
    let endpoint = ChannelEndpoint {
        api_base_url: base_url.to_string(),
        socket_path: "/socket.io/".to_string(),
        namespace: "/jobs".to_string(),
    };
    let bridge = RealtimeCacheBridge::new(transport, cache.clone(), endpoint)
        .with_handshake_timeout(Duration::from_secs(5));
    (bridge, cache)
}

fn job(id: &str) -> JobId {
    JobId::new(id).unwrap()
}

async fn eventually(condition: impl Fn() -> bool) {
    for _ in 0..300 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}

async fn wait_for_state(bridge: &RealtimeCacheBridge, target: ConnectionState) {
    let mut state = bridge.subscribe_state();
    tokio::time::timeout(Duration::from_secs(3), state.wait_for(|s| *s == target))
        .await
        .expect("state not reached in time")
        .expect("state channel closed");
}

// =============================================================================
// Websocket
// =============================================================================

#[tokio::test]
async fn websocket_authenticates_and_delivers_events() {
    let (stub, base_url) = spawn_stub(Stub::with_events(vec![
        ("job-deleted", json!({"jobId": "J1"})),
        ("job-updated", json!({"id": "J2", "title": "Designer"})),
    ]))
    .await;
    let (bridge, cache) = bridge_for(&base_url, Arc::new(WebSocketTransport::new()));

    bridge.connect(BearerToken::new(TOKEN));
    eventually(|| cache.invalidation_count() == 3).await;

    assert!(bridge.is_connected());
    assert_eq!(
        cache.invalidations(),
        vec![CacheKey::jobs(), CacheKey::job(&job("J2")), CacheKey::jobs()]
    );
    assert_eq!(stub.transports(), vec!["websocket".to_string()]);
    assert_eq!(stub.authorizations(), vec![format!("Bearer {}", TOKEN)]);
    assert_eq!(stub.connect_payloads(), vec![json!({ "token": TOKEN })]);
}

#[tokio::test]
async fn websocket_answers_ping_and_says_goodbye() {
    let (stub, base_url) = spawn_stub(Stub::with_events(vec![])).await;
    let (bridge, _cache) = bridge_for(&base_url, Arc::new(WebSocketTransport::new()));

    bridge.connect(BearerToken::new(TOKEN));
    eventually(|| stub.received().contains(&"3".to_string())).await;

    bridge.disconnect();
    eventually(|| stub.received().contains(&"41/jobs,".to_string())).await;
    assert_eq!(bridge.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn connect_error_leaves_bridge_disconnected() {
    let (stub, base_url) = spawn_stub(Stub {
        connect_error: Some("invalid token".to_string()),
        ..Default::default()
    })
    .await;
    let (bridge, cache) = bridge_for(
        &base_url,
        Arc::new(FallbackTransport::from_order(&TransportKind::DEFAULT_ORDER)),
    );

    bridge.connect(BearerToken::new(TOKEN));
    eventually(|| stub.connect_payloads().len() == 1).await;
    wait_for_state(&bridge, ConnectionState::Disconnected).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Rejection is not retried over polling
    assert_eq!(stub.transports(), vec!["websocket".to_string()]);
    assert_eq!(bridge.state(), ConnectionState::Disconnected);
    assert_eq!(cache.invalidation_count(), 0);
}

// =============================================================================
// Polling Fallback
// =============================================================================

#[tokio::test]
async fn falls_back_to_polling_when_websocket_fails() {
    let (stub, base_url) = spawn_stub(Stub {
        reject_websocket: true,
        ..Stub::with_events(vec![(
            "candidate-added-to-job",
            json!({"jobId": 42, "candidateId": "C7"}),
        )])
    })
    .await;
    let (bridge, cache) = bridge_for(
        &base_url,
        Arc::new(FallbackTransport::from_order(&TransportKind::DEFAULT_ORDER)),
    );

    bridge.connect(BearerToken::new(TOKEN));
    eventually(|| cache.invalidation_count() == 5).await;

    assert!(bridge.is_connected());
    assert_eq!(
        cache.invalidations(),
        vec![
            CacheKey::job_applications_by_job(&job("42")),
            CacheKey::job_applications(),
            CacheKey::job_ats_page_data(),
            CacheKey::job(&job("42")),
            CacheKey::jobs(),
        ]
    );

    let transports = stub.transports();
    assert_eq!(transports.first().map(String::as_str), Some("websocket"));
    assert!(transports.iter().skip(1).all(|t| t == "polling"));
    assert!(stub
        .authorizations()
        .iter()
        .all(|auth| auth == &format!("Bearer {}", TOKEN)));
    assert_eq!(stub.connect_payloads(), vec![json!({ "token": TOKEN })]);
}

#[tokio::test]
async fn polling_answers_ping_and_says_goodbye() {
    let (stub, base_url) = spawn_stub(Stub::with_events(vec![])).await;
    let (bridge, _cache) = bridge_for(&base_url, Arc::new(PollingTransport::new()));

    bridge.connect(BearerToken::new(TOKEN));
    wait_for_state(&bridge, ConnectionState::Connected).await;
    eventually(|| stub.received().contains(&"3".to_string())).await;

    bridge.disconnect();
    eventually(|| stub.received().contains(&"41/jobs,".to_string())).await;
    eventually(|| stub.received().contains(&"1".to_string())).await;
}

#[tokio::test]
async fn polling_skips_undecodable_record_and_keeps_the_batch() {
    let (stub, base_url) = spawn_stub(Stub {
        trailing_records: vec!["bAQID".to_string()],
        ..Stub::with_events(vec![("job-deleted", json!({"jobId": "J1"}))])
    })
    .await;
    let (bridge, cache) = bridge_for(&base_url, Arc::new(PollingTransport::new()));

    bridge.connect(BearerToken::new(TOKEN));
    eventually(|| cache.invalidation_count() == 1).await;
    eventually(|| stub.received().contains(&"3".to_string())).await;

    assert!(bridge.is_connected());
    assert_eq!(cache.invalidations(), vec![CacheKey::jobs()]);
    assert_eq!(bridge.stats().events_applied, 1);
}
