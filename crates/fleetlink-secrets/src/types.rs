//! Core types for secrets access.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::SecretsError;

/// A secret value with automatic memory zeroisation.
///
/// The value is stored as a `SecretString` which prevents accidental logging
/// and ensures memory is zeroed when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretValue {
    #[zeroize(skip)]
    inner: SecretString,
}

impl SecretValue {
    /// Creates a new secret value from a string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: SecretString::from(value.into()),
        }
    }

    /// Creates a new secret value from bytes (UTF-8 encoded).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, std::str::Utf8Error> {
        let s = std::str::from_utf8(bytes)?;
        Ok(Self::new(s))
    }

    /// Exposes the secret value for use.
    ///
    /// The returned reference must not be logged, stored, or otherwise
    /// exposed.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.inner.expose_secret()
    }

    /// Returns the length of the secret value in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.expose_secret().len()
    }

    /// Returns true if the secret value is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.expose_secret().is_empty()
    }

    /// Extracts a string field from a secret holding a JSON object.
    ///
    /// Returns `Ok(None)` if the field is absent or not a string. The error
    /// never carries any part of the secret.
    pub fn json_field(&self, field: &str) -> Result<Option<Self>, SecretsError> {
        let document: serde_json::Value =
            serde_json::from_str(self.expose()).map_err(|_| SecretsError::Malformed {
                id: field.to_owned(),
                reason: "secret is not valid JSON".to_owned(),
            })?;

        let Some(object) = document.as_object() else {
            return Err(SecretsError::Malformed {
                id: field.to_owned(),
                reason: "secret is not a JSON object".to_owned(),
            });
        };

        Ok(object
            .get(field)
            .and_then(serde_json::Value::as_str)
            .map(Self::new))
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
