//! In-memory secrets backend for testing and development.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::SecretsError;
use crate::traits::SecretsBackend;
use crate::types::SecretValue;

/// In-memory secrets backend.
///
/// Secrets are seeded with [`MemorySecrets::insert`] and are not persisted
/// across restarts. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySecrets {
    data: Arc<RwLock<HashMap<String, SecretValue>>>,
}

impl MemorySecrets {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a secret, replacing any previous value.
    pub async fn insert(&self, id: impl Into<String>, value: SecretValue) {
        let mut data = self.data.write().await;
        data.insert(id.into(), value);
    }
}

#[async_trait]
impl SecretsBackend for MemorySecrets {
    async fn get(&self, id: &str) -> Result<Option<SecretValue>, SecretsError> {
        let data = self.data.read().await;
        let value = data.get(id).cloned();

        tracing::debug!(
            secret.id = id,
            secret.found = value.is_some(),
            secret.operation = "get",
            "secret lookup"
        );

        Ok(value)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
