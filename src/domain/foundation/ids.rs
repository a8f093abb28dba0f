//! Strongly-typed identifier value objects.
//!
//! Job and candidate identifiers are issued by the REST backend and are
//! opaque to the client, so they wrap strings rather than UUIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::ValidationError;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier, rejecting empty or whitespace-only values.
            ///
            /// The value is kept verbatim; cache keys must match the backend's.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(ValidationError::empty_field($field));
                }
                Ok(Self(value))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

opaque_id!(
    /// Identifier of a job posting.
    JobId,
    "job_id"
);

opaque_id!(
    /// Identifier of a candidate.
    CandidateId,
    "candidate_id"
);

/// Identifier of a single push-channel connection attempt.
///
/// Generated client-side and only used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Creates a new random ConnectionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
