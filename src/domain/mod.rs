//! Domain layer containing the realtime cache-sync types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, errors, state machines)
//! - `realtime` - Events, cache keys, invalidation mapping, connection lifecycle

pub mod foundation;
pub mod realtime;
