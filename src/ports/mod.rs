//! Ports - Interfaces for external collaborators.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the realtime bridge and the outside world. Adapters implement these ports.
//!
//! - `QueryCache` - The host application's query cache (invalidate by prefix)
//! - `CredentialStore` - Persisted bearer token
//! - `PushTransport` - Authenticated server-push channel

mod credential_store;
mod push_transport;
mod query_cache;

pub use credential_store::{CredentialStore, CredentialStoreError};
pub use push_transport::{
    ChannelEndpoint, ChannelFrame, ChannelRequest, PushChannel, PushTransport, TransportError,
};
pub use query_cache::QueryCache;
