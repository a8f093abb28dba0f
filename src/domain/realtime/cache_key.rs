//! Hierarchical query-cache keys.
//!
//! A key is an ordered tuple of string segments. Invalidation is prefix
//! based: invalidating `["jobs"]` also covers `["jobs", "J1"]`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::JobId;

/// Root segment for job list and job detail queries.
pub const JOBS: &str = "jobs";
/// Root segment for job application queries.
pub const JOB_APPLICATIONS: &str = "jobApplications";
/// Second segment for applications scoped to a single job.
pub const BY_JOB: &str = "byJob";
/// Root segment for the aggregated ATS page payload.
pub const JOB_ATS_PAGE_DATA: &str = "jobATSPageData";

/// Ordered identifier path into the client-side query cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(Vec<String>);

impl CacheKey {
    /// Creates a key from its segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// `["jobs"]`
    pub fn jobs() -> Self {
        Self::new([JOBS])
    }

    /// `["jobs", jobId]`
    pub fn job(job_id: &JobId) -> Self {
        Self::new([JOBS, job_id.as_str()])
    }

    /// `["jobApplications"]`
    pub fn job_applications() -> Self {
        Self::new([JOB_APPLICATIONS])
    }

    /// `["jobApplications", "byJob", jobId]`
    pub fn job_applications_by_job(job_id: &JobId) -> Self {
        Self::new([JOB_APPLICATIONS, BY_JOB, job_id.as_str()])
    }

    /// `["jobATSPageData"]`
    pub fn job_ats_page_data() -> Self {
        Self::new([JOB_ATS_PAGE_DATA])
    }

    /// Returns the key segments.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns true if every segment of `self` matches the leading
    /// segments of `other`. The empty key is a prefix of every key.
    pub fn is_prefix_of(&self, other: &CacheKey) -> bool {
        other.0.len() >= self.0.len() && other.0.iter().zip(&self.0).all(|(a, b)| a == b)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", segment)?;
        }
        write!(f, "]")
    }
}
