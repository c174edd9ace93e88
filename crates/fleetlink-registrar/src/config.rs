//! Configuration for fleetlink-registrar.

use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use fleetlink_proto::AccountId;
use fleetlink_secrets::{SecretsBackendConfig, SecretsConfig};
use serde::Deserialize;

use crate::error::{RegistrarError, RegistrarResult};

const ENV_PREFIX: &str = "FLEETLINK_REGISTRAR_";

/// Top-level configuration for the account registrar.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RegistrarConfig {
    /// Vendor API configuration.
    #[serde(default)]
    pub vendor: VendorConfig,

    /// Dead-letter queue configuration.
    #[serde(default)]
    pub dead_letter: DeadLetterConfig,

    /// Secrets backend holding the vendor credential.
    #[serde(default)]
    pub secrets: SecretsConfig,

    /// Lifecycle response delivery for spoke requests.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
}

impl RegistrarConfig {
    /// Load configuration from the default sources.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `registrar.toml` in the current directory (if present)
    /// 3. Environment variables with `FLEETLINK_REGISTRAR_` prefix
    ///
    /// The result is validated before it is returned.
    pub fn load() -> RegistrarResult<Self> {
        Self::from_figment(Figment::new().merge(Toml::file("registrar.toml")))
    }

    /// Load configuration from a specific TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> RegistrarResult<Self> {
        Self::from_figment(Figment::new().merge(Toml::file(path.as_ref())))
    }

    fn from_figment(figment: Figment) -> RegistrarResult<Self> {
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| RegistrarError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings a deployed registrar cannot run without.
    pub fn validate(&self) -> RegistrarResult<()> {
        if self.vendor.account_id == 0 {
            return Err(RegistrarError::config("vendor.account_id is not set"));
        }
        if self.vendor.secret_id.trim().is_empty() {
            return Err(RegistrarError::config("vendor.secret_id is not set"));
        }
        if self.vendor.credential_field.trim().is_empty() {
            return Err(RegistrarError::config("vendor.credential_field is empty"));
        }
        if self.dead_letter.queue_url.trim().is_empty() {
            return Err(RegistrarError::config("dead_letter.queue_url is not set"));
        }
        if self.secrets.backend == SecretsBackendConfig::Memory {
            return Err(RegistrarError::config(
                "secrets.backend is memory, which holds no credential; use env or aws",
            ));
        }
        Ok(())
    }
}

/// Vendor API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VendorConfig {
    /// GraphQL endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Vendor account accounts are linked into.
    #[serde(default)]
    pub account_id: u64,

    /// Identifier of the secret holding the API key.
    #[serde(default)]
    pub secret_id: String,

    /// JSON field of the secret carrying the API key.
    #[serde(default = "default_credential_field")]
    pub credential_field: String,

    /// Input type whose fields name the available integrations.
    #[serde(default = "default_integration_input_type")]
    pub integration_input_type: String,

    /// Prefix of the integration role created in each member account.
    #[serde(default = "default_role_name_prefix")]
    pub role_name_prefix: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://api.newrelic.com/graphql".to_owned()
}

fn default_credential_field() -> String {
    "AccessKey".to_owned()
}

fn default_integration_input_type() -> String {
    "CloudAwsIntegrationsInput".to_owned()
}

fn default_role_name_prefix() -> String {
    "NewRelicIntegrationRole".to_owned()
}

const fn default_timeout_secs() -> u64 {
    30
}

impl VendorConfig {
    /// Request timeout as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Integration role ARN for a member account linked into `vendor_account`.
    #[must_use]
    pub fn role_arn(&self, account: &AccountId, vendor_account: u64) -> String {
        format!(
            "arn:aws:iam::{}:role/{}_{}",
            account, self.role_name_prefix, vendor_account
        )
    }
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            account_id: 0,
            secret_id: String::new(),
            credential_field: default_credential_field(),
            integration_input_type: default_integration_input_type(),
            role_name_prefix: default_role_name_prefix(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Dead-letter queue configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DeadLetterConfig {
    /// Queue URL failing messages are sent to.
    #[serde(default)]
    pub queue_url: String,
}

/// Lifecycle response delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleConfig {
    /// Timeout for the response PUT, in seconds.
    #[serde(default = "default_response_timeout_secs")]
    pub response_timeout_secs: u64,
}

const fn default_response_timeout_secs() -> u64 {
    10
}

impl LifecycleConfig {
    /// Response timeout as a duration.
    #[must_use]
    pub const fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_secs)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            response_timeout_secs: default_response_timeout_secs(),
        }
    }
}
