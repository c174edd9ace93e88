//! Vendor API credential.

use std::fmt;

use fleetlink_secrets::{SecretValue, SecretsBackend, SecretsError};
use tracing::debug;

use crate::error::{RegistrarError, RegistrarResult};

/// API key for the vendor GraphQL endpoint.
///
/// Fetched per registration attempt and never persisted. `Debug` is redacted.
#[derive(Clone)]
pub struct VendorCredential {
    key: SecretValue,
}

impl VendorCredential {
    /// Wrap an API key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: SecretValue::new(key),
        }
    }

    /// Read the credential from a JSON secret.
    ///
    /// A missing secret, a secret that is not a JSON object, and a missing
    /// field are all errors.
    pub async fn fetch(
        backend: &dyn SecretsBackend,
        secret_id: &str,
        field: &str,
    ) -> RegistrarResult<Self> {
        let secret = backend
            .get(secret_id)
            .await?
            .ok_or_else(|| SecretsError::NotFound {
                id: secret_id.to_owned(),
            })?;

        let key = secret
            .json_field(field)?
            .filter(|key| !key.is_empty())
            .ok_or_else(|| RegistrarError::MissingCredentialField(field.to_owned()))?;

        debug!(secret.id = secret_id, backend = backend.name(), "vendor credential fetched");
        Ok(Self { key })
    }

    /// The API key, for the request header only.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.key.expose()
    }
}

impl fmt::Debug for VendorCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VendorCredential")
            .field("key", &self.key)
            .finish()
    }
}
