//! In-memory credential store.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::realtime::BearerToken;
use crate::ports::{CredentialStore, CredentialStoreError};

/// Holds an optional token in memory. Useful for embedding and tests.
#[derive(Default)]
pub struct StaticCredentialStore {
    token: RwLock<Option<BearerToken>>,
}

impl StaticCredentialStore {
    pub fn new(token: Option<BearerToken>) -> Self {
        Self {
            token: RwLock::new(token),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Replace the stored token (login / logout).
    pub fn set(&self, token: Option<BearerToken>) {
        *self
            .token
            .write()
            .expect("StaticCredentialStore: token lock poisoned") = token;
    }
}

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn load_token(&self) -> Result<Option<BearerToken>, CredentialStoreError> {
        Ok(self
            .token
            .read()
            .expect("StaticCredentialStore: token lock poisoned")
            .clone())
    }
}

impl std::fmt::Debug for StaticCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentialStore").finish_non_exhaustive()
    }
}
