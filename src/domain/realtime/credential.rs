//! Bearer credential presented to the push channel.

use secrecy::{ExposeSecret, SecretString};

/// Opaque bearer token.
///
/// The value is held in a [`SecretString`] so it never shows up in `Debug`
/// output or log fields.
#[derive(Clone)]
pub struct BearerToken(SecretString);

impl BearerToken {
    /// Wraps a raw token. Empty or whitespace-only tokens count as absent.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(SecretString::new(trimmed.to_string())))
    }

    /// Returns the raw token for placing on the wire.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Value for an `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.expose())
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}
