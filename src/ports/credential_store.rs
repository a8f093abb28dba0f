//! CredentialStore port - Where the bearer token for the push channel lives.
//!
//! In the browser client this is per-origin local storage. Absence of a
//! token is a normal state (logged-out user), so it is `Ok(None)`, not an
//! error.

use async_trait::async_trait;

use crate::domain::realtime::BearerToken;

/// Errors that can occur while reading the credential store.
#[derive(Debug, thiserror::Error)]
pub enum CredentialStoreError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Credential store is corrupt: {0}")]
    Corrupt(String),
}

/// Port for reading the persisted bearer token.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read the current token, if any.
    ///
    /// # Errors
    /// Returns `CredentialStoreError` if the store exists but cannot be read.
    async fn load_token(&self) -> Result<Option<BearerToken>, CredentialStoreError>;
}
