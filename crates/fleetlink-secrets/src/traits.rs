//! Traits for secrets backend implementations.

use async_trait::async_trait;

use crate::error::SecretsError;
use crate::types::SecretValue;

/// Read-only backend trait for secrets lookup.
///
/// Secrets are addressed by an opaque identifier: a name for the memory and
/// environment backends, a name or ARN for AWS Secrets Manager.
#[async_trait]
pub trait SecretsBackend: Send + Sync {
    /// Retrieves a secret by identifier.
    ///
    /// Returns `None` if the secret does not exist. Errors are reserved for
    /// failures to reach or read the store.
    async fn get(&self, id: &str) -> Result<Option<SecretValue>, SecretsError>;

    /// Checks if a secret exists.
    async fn exists(&self, id: &str) -> Result<bool, SecretsError> {
        Ok(self.get(id).await?.is_some())
    }

    /// Short name of the backend, for logging.
    fn name(&self) -> &'static str;
}
