//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that the realtime
//! domain is built from.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{CandidateId, ConnectionId, JobId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
