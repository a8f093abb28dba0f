//! Credential store configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Location of the persisted bearer token
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    /// Local-storage style JSON file
    pub store_path: PathBuf,

    /// Origin whose entries hold the token
    pub origin: String,

    /// Key the token is stored under
    #[serde(default = "default_token_key")]
    pub token_key: String,
}

impl CredentialsConfig {
    /// Validate credential store configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.store_path.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("credentials.store_path"));
        }
        if self.origin.trim().is_empty() {
            return Err(ValidationError::MissingRequired("credentials.origin"));
        }
        if self.token_key.trim().is_empty() {
            return Err(ValidationError::MissingRequired("credentials.token_key"));
        }
        Ok(())
    }
}

fn default_token_key() -> String {
    "token".to_string()
}
