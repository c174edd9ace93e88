//! Selects a secrets backend from configuration.

use std::fmt;
use std::sync::Arc;

use crate::config::{SecretsBackendConfig, SecretsConfig};
use crate::env::EnvSecrets;
use crate::error::SecretsError;
use crate::memory::MemorySecrets;
use crate::traits::SecretsBackend;

/// Holds the backend chosen for this process.
#[derive(Clone, Default)]
#[must_use]
pub struct SecretsProvider {
    backend: Option<Arc<dyn SecretsBackend>>,
}

impl SecretsProvider {
    /// A provider without a backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the backend named by `config`.
    ///
    /// The AWS backend resolves credentials and region through the SDK
    /// default chain unless a region is configured.
    pub async fn from_config(config: &SecretsConfig) -> Result<Self, SecretsError> {
        let backend: Arc<dyn SecretsBackend> = match &config.backend {
            SecretsBackendConfig::Memory => Arc::new(MemorySecrets::new()),
            SecretsBackendConfig::Env { prefix } => Arc::new(EnvSecrets::with_prefix(prefix)),
            #[cfg(feature = "aws")]
            SecretsBackendConfig::Aws { region } => {
                let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
                if let Some(region) = region {
                    loader = loader.region(aws_config::Region::new(region.clone()));
                }
                Arc::new(crate::aws::AwsSecrets::from_conf(&loader.load().await))
            }
        };

        tracing::info!(backend = backend.name(), "secrets backend selected");
        Ok(Self::new().with_backend(backend))
    }

    /// Use an existing backend.
    pub fn with_backend(mut self, backend: Arc<dyn SecretsBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// The selected backend.
    pub fn backend(&self) -> Result<Arc<dyn SecretsBackend>, SecretsError> {
        self.backend.clone().ok_or(SecretsError::NotConfigured)
    }
}

impl fmt::Debug for SecretsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.backend {
            Some(backend) => write!(f, "SecretsProvider({})", backend.name()),
            None => f.write_str("SecretsProvider(unconfigured)"),
        }
    }
}
