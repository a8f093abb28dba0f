//! File-backed credential store.
//!
//! The file mirrors browser local storage: one JSON object per origin,
//! each holding string key/value pairs.
//!
//! ```json
//! {
//!   "https://app.example.com": { "token": "eyJhbGciOi..." }
//! }
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::realtime::BearerToken;
use crate::ports::{CredentialStore, CredentialStoreError};

/// Default key the token is stored under.
pub const DEFAULT_TOKEN_KEY: &str = "token";

/// Reads the bearer token for one origin from a local-storage style file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
    origin: String,
    token_key: String,
}

impl FileCredentialStore {
    /// # Example
    /// ```ignore
    /// let store = FileCredentialStore::new("./storage.json", "https://app.example.com");
    /// ```
    pub fn new<P: AsRef<Path>>(path: P, origin: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            origin: origin.into(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
        }
    }

    pub fn with_token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = key.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load_token(&self) -> Result<Option<BearerToken>, CredentialStoreError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No credential file");
                return Ok(None);
            }
            Err(e) => return Err(CredentialStoreError::IoError(e.to_string())),
        };

        let document: Value = serde_json::from_str(&content)
            .map_err(|e| CredentialStoreError::Corrupt(e.to_string()))?;
        let origins = document
            .as_object()
            .ok_or_else(|| CredentialStoreError::Corrupt("root is not an object".to_string()))?;

        let Some(entries) = origins.get(&self.origin) else {
            return Ok(None);
        };
        let entries = entries.as_object().ok_or_else(|| {
            CredentialStoreError::Corrupt(format!("entry for '{}' is not an object", self.origin))
        })?;

        match entries.get(&self.token_key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(raw)) => Ok(BearerToken::new(raw.as_str())),
            Some(_) => Err(CredentialStoreError::Corrupt(format!(
                "'{}' is not a string",
                self.token_key
            ))),
        }
    }
}
