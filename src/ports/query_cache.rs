//! QueryCache port - The one capability the bridge needs from the client cache.
//!
//! The cache itself (storage, refetching, deduplication of concurrent
//! refetches) belongs to the host application. The bridge only ever marks
//! results stale through this interface.

use crate::domain::realtime::CacheKey;

/// Port for invalidating cached query results by key prefix.
///
/// Matching is hierarchical: invalidating `["jobs"]` must affect every
/// entry cached under `["jobs", <anything>...]`.
///
/// `invalidate` is a signal, not a round-trip. Implementations should mark
/// entries stale and return; refetching happens on the next read.
///
/// # Example
///
/// ```ignore
/// struct ReactQueryBridge { client: QueryClientHandle }
///
/// impl QueryCache for ReactQueryBridge {
///     fn invalidate(&self, prefix: &CacheKey) {
///         self.client.invalidate_queries(prefix.segments());
///     }
/// }
/// ```
pub trait QueryCache: Send + Sync {
    /// Mark every cached result whose key starts with `prefix` as stale.
    fn invalidate(&self, prefix: &CacheKey);
}
