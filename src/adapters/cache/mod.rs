//! Query cache adapters.

mod in_memory;

pub use in_memory::{CachedQuery, InMemoryQueryCache};
