//! Turns push-channel events into cache invalidations.

use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::domain::realtime::{invalidation_plan, EventDecodeError, JobEvent, RealtimeEventKind};
use crate::ports::QueryCache;

use super::gate::SessionGate;

/// Counters kept across sessions, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub events_received: u64,
    pub events_applied: u64,
    pub events_dropped: u64,
    pub invalidations_issued: u64,
}

/// Result of handling one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// The event was recognised and its keys invalidated.
    Applied {
        kind: RealtimeEventKind,
        invalidations: usize,
    },
    /// Not one of the job-domain events.
    Unknown,
    /// Recognised name, unusable payload.
    Malformed,
    /// The session was torn down before the event could be applied.
    SessionClosed,
}

/// Applies the fixed event→keys mapping to a [`QueryCache`].
pub struct CacheInvalidator {
    cache: Arc<dyn QueryCache>,
    received: AtomicU64,
    applied: AtomicU64,
    dropped: AtomicU64,
    invalidations: AtomicU64,
}

impl CacheInvalidator {
    pub fn new(cache: Arc<dyn QueryCache>) -> Self {
        Self {
            cache,
            received: AtomicU64::new(0),
            applied: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    /// Handle one event received by the session guarded by `gate`.
    ///
    /// The whole invalidation plan runs under the gate, so an event is
    /// either applied completely or not at all relative to teardown.
    pub fn handle(&self, name: &str, payload: &Value, gate: &SessionGate) -> HandleOutcome {
        self.received.fetch_add(1, Ordering::Relaxed);

        let event = match JobEvent::decode(name, payload) {
            Ok(event) => event,
            Err(EventDecodeError::UnknownEvent(_)) => {
                tracing::debug!(event = name, "Ignoring unknown event");
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return HandleOutcome::Unknown;
            }
            Err(e) => {
                tracing::warn!(event = name, error = %e, "Dropping malformed event");
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return HandleOutcome::Malformed;
            }
        };

        let kind = event.kind();
        let plan = invalidation_plan(&event);

        let applied = gate.run(|| {
            for key in &plan {
                tracing::debug!(event = kind.as_str(), key = %key, "Invalidating");
                self.cache.invalidate(key);
            }
        });

        match applied {
            Some(()) => {
                self.applied.fetch_add(1, Ordering::Relaxed);
                self.invalidations
                    .fetch_add(plan.len() as u64, Ordering::Relaxed);
                HandleOutcome::Applied {
                    kind,
                    invalidations: plan.len(),
                }
            }
            None => {
                tracing::debug!(event = kind.as_str(), "Session closed, event not applied");
                self.dropped.fetch_add(1, Ordering::Relaxed);
                HandleOutcome::SessionClosed
            }
        }
    }

    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            events_received: self.received.load(Ordering::Relaxed),
            events_applied: self.applied.load(Ordering::Relaxed),
            events_dropped: self.dropped.load(Ordering::Relaxed),
            invalidations_issued: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for CacheInvalidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheInvalidator")
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::realtime::CacheKey;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingCache {
        keys: Mutex<Vec<CacheKey>>,
    }

    impl RecordingCache {
        fn keys(&self) -> Vec<CacheKey> {
            self.keys.lock().unwrap().clone()
        }
    }

    impl QueryCache for RecordingCache {
        fn invalidate(&self, prefix: &CacheKey) {
            self.keys.lock().unwrap().push(prefix.clone());
        }
    }

    fn setup() -> (Arc<RecordingCache>, CacheInvalidator) {
        let cache = Arc::new(RecordingCache::default());
        let invalidator = CacheInvalidator::new(cache.clone());
        (cache, invalidator)
    }

    #[test]
    fn applies_the_plan_for_known_events() {
        let (cache, invalidator) = setup();
        let gate = SessionGate::new();

        let outcome = invalidator.handle("job-deleted", &json!({"jobId": "J1"}), &gate);

        assert_eq!(
            outcome,
            HandleOutcome::Applied {
                kind: RealtimeEventKind::JobDeleted,
                invalidations: 1
            }
        );
        assert_eq!(cache.keys(), vec![CacheKey::jobs()]);
    }

    #[test]
    fn unknown_events_invalidate_nothing() {
        let (cache, invalidator) = setup();
        let gate = SessionGate::new();

        let outcome = invalidator.handle("user-updated", &json!({"id": "U1"}), &gate);

        assert_eq!(outcome, HandleOutcome::Unknown);
        assert!(cache.keys().is_empty());
    }

    #[test]
    fn malformed_payloads_invalidate_nothing() {
        let (cache, invalidator) = setup();
        let gate = SessionGate::new();

        assert_eq!(
            invalidator.handle("job-updated", &json!({"title": "no id"}), &gate),
            HandleOutcome::Malformed
        );
        assert_eq!(
            invalidator.handle("job-deleted", &json!("J1"), &gate),
            HandleOutcome::Malformed
        );
        assert!(cache.keys().is_empty());
    }

    #[test]
    fn closed_gate_blocks_invalidation() {
        let (cache, invalidator) = setup();
        let gate = SessionGate::new();
        gate.close();

        let outcome = invalidator.handle("job-created", &json!({"id": "J9"}), &gate);

        assert_eq!(outcome, HandleOutcome::SessionClosed);
        assert!(cache.keys().is_empty());
    }

    #[test]
    fn stats_track_every_outcome() {
        let (_cache, invalidator) = setup();
        let gate = SessionGate::new();

        invalidator.handle(
            "candidate-added-to-job",
            &json!({"jobId": "J1", "candidateId": "C1"}),
            &gate,
        );
        invalidator.handle("mystery", &Value::Null, &gate);
        invalidator.handle("job-status-changed", &json!({}), &gate);

        assert_eq!(
            invalidator.stats(),
            BridgeStats {
                events_received: 3,
                events_applied: 1,
                events_dropped: 2,
                invalidations_issued: 5,
            }
        );
    }
}
