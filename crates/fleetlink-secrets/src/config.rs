//! Configuration types for secrets backends.

use serde::Deserialize;

/// Configuration for secrets access.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SecretsConfig {
    /// The backend to read secrets from.
    #[serde(default)]
    pub backend: SecretsBackendConfig,
}

/// Backend configuration variants.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SecretsBackendConfig {
    /// In-memory backend for testing.
    #[default]
    Memory,

    /// Environment variable backend.
    Env {
        /// Environment variable prefix (default: `FLEETLINK_SECRET`).
        #[serde(default = "default_env_prefix")]
        prefix: String,
    },

    /// AWS Secrets Manager.
    #[cfg(feature = "aws")]
    Aws {
        /// Region override; the SDK default chain is used when absent.
        #[serde(default)]
        region: Option<String>,
    },
}

fn default_env_prefix() -> String {
    "FLEETLINK_SECRET".to_owned()
}
