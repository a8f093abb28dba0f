//! Job-domain events received on the push channel.
//!
//! The server emits a small, fixed set of named events with loosely
//! structured JSON payloads. [`JobEvent::decode`] turns a raw
//! `(name, payload)` pair into a typed event, or explains why it cannot.

use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::domain::foundation::{CandidateId, JobId};

/// Names of all events the bridge listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealtimeEventKind {
    CandidateAddedToJob,
    JobCreated,
    JobUpdated,
    JobDeleted,
    JobStatusChanged,
}

impl RealtimeEventKind {
    /// Every known event kind.
    pub const ALL: [RealtimeEventKind; 5] = [
        RealtimeEventKind::CandidateAddedToJob,
        RealtimeEventKind::JobCreated,
        RealtimeEventKind::JobUpdated,
        RealtimeEventKind::JobDeleted,
        RealtimeEventKind::JobStatusChanged,
    ];

    /// Wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            RealtimeEventKind::CandidateAddedToJob => "candidate-added-to-job",
            RealtimeEventKind::JobCreated => "job-created",
            RealtimeEventKind::JobUpdated => "job-updated",
            RealtimeEventKind::JobDeleted => "job-deleted",
            RealtimeEventKind::JobStatusChanged => "job-status-changed",
        }
    }

    /// Looks up a kind by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for RealtimeEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a raw event could not be turned into a [`JobEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventDecodeError {
    #[error("Unknown event '{0}'")]
    UnknownEvent(String),

    #[error("Payload of '{event}' is not an object")]
    NotAnObject { event: RealtimeEventKind },

    #[error("Payload of '{event}' is missing '{field}'")]
    MissingField {
        event: RealtimeEventKind,
        field: &'static str,
    },

    #[error("Payload of '{event}' has invalid '{field}': {reason}")]
    InvalidField {
        event: RealtimeEventKind,
        field: &'static str,
        reason: String,
    },
}

/// A decoded job-domain event.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    CandidateAddedToJob {
        job_id: JobId,
        candidate_id: Option<CandidateId>,
        application: Option<Value>,
    },
    JobCreated {
        job: Value,
    },
    JobUpdated {
        job_id: JobId,
        job: Value,
    },
    JobDeleted {
        job_id: JobId,
    },
    JobStatusChanged {
        job_id: JobId,
        status: Option<String>,
    },
}

impl JobEvent {
    /// The kind of this event.
    pub fn kind(&self) -> RealtimeEventKind {
        match self {
            JobEvent::CandidateAddedToJob { .. } => RealtimeEventKind::CandidateAddedToJob,
            JobEvent::JobCreated { .. } => RealtimeEventKind::JobCreated,
            JobEvent::JobUpdated { .. } => RealtimeEventKind::JobUpdated,
            JobEvent::JobDeleted { .. } => RealtimeEventKind::JobDeleted,
            JobEvent::JobStatusChanged { .. } => RealtimeEventKind::JobStatusChanged,
        }
    }

    /// Decodes a raw event received on the push channel.
    pub fn decode(name: &str, payload: &Value) -> Result<Self, EventDecodeError> {
        let kind = RealtimeEventKind::from_name(name)
            .ok_or_else(|| EventDecodeError::UnknownEvent(name.to_string()))?;
        let fields = payload
            .as_object()
            .ok_or(EventDecodeError::NotAnObject { event: kind })?;

        let event = match kind {
            RealtimeEventKind::CandidateAddedToJob => JobEvent::CandidateAddedToJob {
                job_id: required_job_id(kind, fields, &["jobId", "job_id"], "jobId")?,
                candidate_id: lenient_candidate_id(kind, fields),
                application: fields.get("application").cloned(),
            },
            RealtimeEventKind::JobCreated => JobEvent::JobCreated {
                job: payload.clone(),
            },
            RealtimeEventKind::JobUpdated => JobEvent::JobUpdated {
                job_id: required_job_id(kind, fields, &["id", "_id"], "id")?,
                job: payload.clone(),
            },
            RealtimeEventKind::JobDeleted => JobEvent::JobDeleted {
                job_id: required_job_id(kind, fields, &["jobId", "job_id"], "jobId")?,
            },
            RealtimeEventKind::JobStatusChanged => JobEvent::JobStatusChanged {
                job_id: required_job_id(kind, fields, &["jobId", "job_id"], "jobId")?,
                status: fields
                    .get("status")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
        };

        Ok(event)
    }
}

fn invalid(event: RealtimeEventKind, field: &'static str, reason: impl ToString) -> EventDecodeError {
    EventDecodeError::InvalidField {
        event,
        field,
        reason: reason.to_string(),
    }
}

/// The candidate does not take part in invalidation, so a bad value only
/// costs the field, never the event.
fn lenient_candidate_id(
    event: RealtimeEventKind,
    fields: &Map<String, Value>,
) -> Option<CandidateId> {
    let parsed = optional_id(event, fields, &["candidateId", "candidate_id"], "candidateId")
        .and_then(|raw| {
            raw.map(CandidateId::new)
                .transpose()
                .map_err(|e| invalid(event, "candidateId", e))
        });

    match parsed {
        Ok(candidate_id) => candidate_id,
        Err(e) => {
            tracing::debug!(event = %event, error = %e, "Ignoring unusable candidate id");
            None
        }
    }
}

/// Reads the first non-null alias as an identifier. Strings are used as-is,
/// numbers are rendered in decimal.
fn optional_id(
    event: RealtimeEventKind,
    fields: &Map<String, Value>,
    aliases: &[&str],
    field: &'static str,
) -> Result<Option<String>, EventDecodeError> {
    let Some(value) = aliases
        .iter()
        .filter_map(|alias| fields.get(*alias))
        .find(|value| !value.is_null())
    else {
        return Ok(None);
    };

    match value {
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(invalid(event, field, format!("expected string or number, got {}", other))),
    }
}

fn required_job_id(
    event: RealtimeEventKind,
    fields: &Map<String, Value>,
    aliases: &[&str],
    field: &'static str,
) -> Result<JobId, EventDecodeError> {
    let raw = optional_id(event, fields, aliases, field)?
        .ok_or(EventDecodeError::MissingField { event, field })?;
    JobId::new(raw).map_err(|e| invalid(event, field, e))
}
