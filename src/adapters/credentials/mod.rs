//! Credential store adapters.

mod file_store;
mod static_store;

pub use file_store::{FileCredentialStore, DEFAULT_TOKEN_KEY};
pub use static_store::StaticCredentialStore;
