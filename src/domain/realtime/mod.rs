//! Realtime cache-sync domain.
//!
//! Pure types with no I/O: the events the push channel carries, the cache
//! keys they affect, the mapping between the two, and the connection
//! lifecycle.

mod cache_key;
mod connection;
mod credential;
mod events;
mod invalidation;

pub use cache_key::{CacheKey, BY_JOB, JOBS, JOB_APPLICATIONS, JOB_ATS_PAGE_DATA};
pub use connection::{ConnectionState, TransportKind};
pub use credential::BearerToken;
pub use events::{EventDecodeError, JobEvent, RealtimeEventKind};
pub use invalidation::invalidation_plan;
