//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the bridge to external systems:
//! - `realtime` - Socket.IO push transports and the cache-sync bridge
//! - `cache` - In-memory query cache
//! - `credentials` - Token stores (local-storage file, static)

pub mod cache;
pub mod credentials;
pub mod realtime;

pub use cache::InMemoryQueryCache;
pub use credentials::{FileCredentialStore, StaticCredentialStore};
pub use realtime::{FallbackTransport, PollingTransport, RealtimeCacheBridge, WebSocketTransport};
