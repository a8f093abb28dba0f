//! Runs the realtime cache-sync bridge against an in-memory cache until
//! interrupted, logging every invalidation.

use std::sync::Arc;

use talent_realtime::adapters::{
    FallbackTransport, FileCredentialStore, InMemoryQueryCache, RealtimeCacheBridge,
};
use talent_realtime::config::AppConfig;
use talent_realtime::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = AppConfig::load()?;
    config.validate()?;
    telemetry::init_tracing(&config.telemetry)?;

    let store = FileCredentialStore::new(
        &config.credentials.store_path,
        config.credentials.origin.clone(),
    )
    .with_token_key(config.credentials.token_key.clone());
    let transport = Arc::new(FallbackTransport::from_order(&config.realtime.transport_order()?));
    let cache = Arc::new(InMemoryQueryCache::new());

    let bridge = RealtimeCacheBridge::new(transport, cache.clone(), config.realtime.endpoint())
        .with_handshake_timeout(config.realtime.handshake_timeout());

    tracing::info!(
        api_base_url = %config.realtime.api_base_url,
        namespace = %config.realtime.namespace,
        transports = %config.realtime.transports,
        "Starting realtime cache sync"
    );

    let mut state = bridge.subscribe_state();
    let watcher = tokio::spawn(async move {
        while state.changed().await.is_ok() {
            let current = *state.borrow_and_update();
            tracing::info!(state = %current, "Connection state changed");
        }
    });

    bridge.connect_from_store(&store).await;

    tokio::signal::ctrl_c().await?;

    bridge.disconnect();
    let stats = bridge.stats();
    tracing::info!(
        events_received = stats.events_received,
        events_applied = stats.events_applied,
        events_dropped = stats.events_dropped,
        invalidations_issued = stats.invalidations_issued,
        stale_keys = cache.stale_keys().len(),
        "Realtime cache sync stopped"
    );

    drop(bridge);
    watcher.abort();
    Ok(())
}
