//! In-memory query cache.
//!
//! Stands in for the host application's cache in the binary and in tests.
//! Entries are marked stale on invalidation; nothing is refetched here.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::domain::realtime::CacheKey;
use crate::ports::QueryCache;

/// A cached query result.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedQuery {
    pub data: Value,
    pub stale: bool,
    pub fetched_at: Timestamp,
}

/// In-memory [`QueryCache`] with hierarchical prefix invalidation.
///
/// # Panics
///
/// Methods panic if an internal lock is poisoned.
///
/// # Example
///
/// ```ignore
/// let cache = InMemoryQueryCache::new();
/// cache.put(CacheKey::job(&job_id), json!({"title": "Engineer"}));
///
/// cache.invalidate(&CacheKey::jobs());
/// assert!(cache.is_stale(&CacheKey::job(&job_id)));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryQueryCache {
    entries: RwLock<HashMap<CacheKey, CachedQuery>>,
    invalidations: RwLock<Vec<CacheKey>>,
}

impl InMemoryQueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a fresh result under `key`, replacing any previous one.
    pub fn put(&self, key: CacheKey, data: Value) {
        self.entries
            .write()
            .expect("InMemoryQueryCache: entries lock poisoned")
            .insert(
                key,
                CachedQuery {
                    data,
                    stale: false,
                    fetched_at: Timestamp::now(),
                },
            );
    }

    pub fn get(&self, key: &CacheKey) -> Option<CachedQuery> {
        self.entries
            .read()
            .expect("InMemoryQueryCache: entries lock poisoned")
            .get(key)
            .cloned()
    }

    /// True if `key` is cached and marked stale.
    pub fn is_stale(&self, key: &CacheKey) -> bool {
        self.get(key).map(|entry| entry.stale).unwrap_or(false)
    }

    /// All stale keys, sorted.
    pub fn stale_keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self
            .entries
            .read()
            .expect("InMemoryQueryCache: entries lock poisoned")
            .iter()
            .filter(|(_, entry)| entry.stale)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    // === Test Helpers ===

    /// Every prefix passed to `invalidate`, in call order.
    pub fn invalidations(&self) -> Vec<CacheKey> {
        self.invalidations
            .read()
            .expect("InMemoryQueryCache: invalidations lock poisoned")
            .clone()
    }

    pub fn invalidation_count(&self) -> usize {
        self.invalidations
            .read()
            .expect("InMemoryQueryCache: invalidations lock poisoned")
            .len()
    }
}

impl QueryCache for InMemoryQueryCache {
    fn invalidate(&self, prefix: &CacheKey) {
        let mut entries = self
            .entries
            .write()
            .expect("InMemoryQueryCache: entries lock poisoned");
        for (key, entry) in entries.iter_mut() {
            if prefix.is_prefix_of(key) {
                entry.stale = true;
            }
        }
        drop(entries);

        self.invalidations
            .write()
            .expect("InMemoryQueryCache: invalidations lock poisoned")
            .push(prefix.clone());
    }
}
