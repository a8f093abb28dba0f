//! Event → cache invalidation mapping.
//!
//! The mapping is a single exhaustive `match`: adding an event kind without
//! deciding which queries it affects does not compile.

use super::cache_key::CacheKey;
use super::events::JobEvent;

/// Cache key prefixes that become stale when `event` is received.
pub fn invalidation_plan(event: &JobEvent) -> Vec<CacheKey> {
    match event {
        JobEvent::CandidateAddedToJob { job_id, .. } => vec![
            CacheKey::job_applications_by_job(job_id),
            CacheKey::job_applications(),
            CacheKey::job_ats_page_data(),
            CacheKey::job(job_id),
            CacheKey::jobs(),
        ],
        JobEvent::JobCreated { .. } => vec![CacheKey::jobs()],
        JobEvent::JobUpdated { job_id, .. } => vec![CacheKey::job(job_id), CacheKey::jobs()],
        JobEvent::JobDeleted { .. } => vec![CacheKey::jobs()],
        JobEvent::JobStatusChanged { job_id, .. } => {
            vec![CacheKey::job(job_id), CacheKey::jobs()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::JobId;
    use crate::domain::realtime::RealtimeEventKind;
    use serde_json::json;

    fn plan(name: &str, payload: serde_json::Value) -> Vec<CacheKey> {
        invalidation_plan(&JobEvent::decode(name, &payload).unwrap())
    }

    fn j1() -> JobId {
        JobId::new("J1").unwrap()
    }

    #[test]
    fn candidate_added_invalidates_all_five_families() {
        let keys = plan(
            "candidate-added-to-job",
            json!({"jobId": "J1", "candidateId": "C1"}),
        );

        assert_eq!(
            keys,
            vec![
                CacheKey::new(["jobApplications", "byJob", "J1"]),
                CacheKey::new(["jobApplications"]),
                CacheKey::new(["jobATSPageData"]),
                CacheKey::new(["jobs", "J1"]),
                CacheKey::new(["jobs"]),
            ]
        );
    }

    #[test]
    fn blank_candidate_does_not_change_the_plan() {
        let with_candidate = plan(
            "candidate-added-to-job",
            json!({"jobId": "J1", "candidateId": "C1"}),
        );
        let blank_candidate = plan(
            "candidate-added-to-job",
            json!({"jobId": "J1", "candidateId": ""}),
        );

        assert_eq!(blank_candidate, with_candidate);
    }

    #[test]
    fn job_created_invalidates_job_lists() {
        assert_eq!(plan("job-created", json!({"title": "SRE"})), vec![CacheKey::jobs()]);
    }

    #[test]
    fn job_updated_invalidates_detail_and_lists() {
        assert_eq!(
            plan("job-updated", json!({"id": "J1", "title": "SRE"})),
            vec![CacheKey::job(&j1()), CacheKey::jobs()]
        );
    }

    #[test]
    fn job_deleted_invalidates_job_lists() {
        assert_eq!(plan("job-deleted", json!({"jobId": "J1"})), vec![CacheKey::jobs()]);
    }

    #[test]
    fn status_change_leaves_applications_alone() {
        let keys = plan(
            "job-status-changed",
            json!({"jobId": "J1", "status": "Interviewing"}),
        );

        assert_eq!(keys, vec![CacheKey::new(["jobs", "J1"]), CacheKey::new(["jobs"])]);
        assert!(!keys
            .iter()
            .any(|k| k.segments().first().map(String::as_str) == Some("jobApplications")));
    }

    #[test]
    fn every_kind_has_a_non_empty_plan() {
        let payload = json!({"id": "J1", "jobId": "J1"});
        for kind in RealtimeEventKind::ALL {
            let event = JobEvent::decode(kind.as_str(), &payload).unwrap();
            assert!(
                !invalidation_plan(&event).is_empty(),
                "{} has no invalidations",
                kind
            );
        }
    }

    #[test]
    fn plans_never_repeat_a_key() {
        let payload = json!({"id": "J1", "jobId": "J1"});
        for kind in RealtimeEventKind::ALL {
            let keys = invalidation_plan(&JobEvent::decode(kind.as_str(), &payload).unwrap());
            let mut deduped = keys.clone();
            deduped.sort();
            deduped.dedup();
            assert_eq!(keys.len(), deduped.len(), "{} repeats a key", kind);
        }
    }
}
