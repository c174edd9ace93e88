//! Configuration for fleetlink-control.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use fleetlink_proto::AccountId;
use serde::{Deserialize, Deserializer};

use crate::error::{ControlError, ControlResult};
use crate::types::{DeploymentTemplate, TemplateName, TemplateParameter};

/// Template parameters supplied verbatim from the environment, in template order.
pub const TEMPLATE_PARAMETER_KEYS: [&str; 14] = [
    "NewRelicLicenseKey",
    "NewRelicDatacenter",
    "CloudWatchMetricsStreamingTemplateURL",
    "CloudWatchMetricStreamName",
    "FirehoseStreamName",
    "S3BackupBucketName",
    "InstallationType",
    "Action",
    "AdditionalParametersLicenseKey",
    "NewRelicLogsEndpoint",
    "InstallNewrelicInfrastructureAgentInEc2InstancesStackURL",
    "NewRelicInfraAgentInstallerName",
    "TargetEC2TagKey",
    "TargetEC2TagValue",
];

/// Parameter carrying the vendor account id. Always first.
pub const VENDOR_ACCOUNT_PARAMETER: &str = "NewRelicAccountNumber";

const ENV_PREFIX: &str = "FLEETLINK_CONTROL_";

/// Top-level configuration for the fleet deployment manager.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ControlConfig {
    /// Deployment template configuration.
    #[serde(default)]
    pub template: TemplateConfig,

    /// Fan-out topic configuration.
    #[serde(default)]
    pub fan_out: FanOutConfig,

    /// Teardown behaviour.
    #[serde(default)]
    pub teardown: TeardownConfig,

    /// Lifecycle response delivery.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Vendor account the fleet reports into.
    #[serde(default)]
    pub vendor_account_id: u64,

    /// Template parameter values keyed by parameter name.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl ControlConfig {
    /// Load configuration from the default sources.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `control.toml` in the current directory (if present)
    /// 3. Environment variables with `FLEETLINK_CONTROL_` prefix
    /// 4. Template parameters named exactly as in [`TEMPLATE_PARAMETER_KEYS`]
    pub fn load() -> ControlResult<Self> {
        Self::from_figment(Figment::new().merge(Toml::file("control.toml")))
    }

    /// Load configuration from a specific TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> ControlResult<Self> {
        Self::from_figment(Figment::new().merge(Toml::file(path.as_ref())))
    }

    fn from_figment(figment: Figment) -> ControlResult<Self> {
        let mut config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ControlError::Config(e.to_string()))?;

        for key in TEMPLATE_PARAMETER_KEYS {
            if let Ok(value) = std::env::var(key) {
                config.parameters.insert(key.to_owned(), value);
            }
        }

        Ok(config)
    }

    /// Parsed seed accounts. Blank entries are ignored.
    pub fn seed_accounts(&self) -> ControlResult<Vec<AccountId>> {
        self.fan_out
            .seed_accounts
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| AccountId::parse(s).map_err(ControlError::from))
            .collect()
    }

    /// Build the deployment template for the given management account.
    ///
    /// The vendor account parameter leads, followed by [`TEMPLATE_PARAMETER_KEYS`]
    /// in order. Every parameter must be present.
    pub fn template(&self, management_account: &AccountId) -> ControlResult<DeploymentTemplate> {
        if self.template.name.is_empty() {
            return Err(ControlError::config("template.name is not set"));
        }
        if self.template.url.is_empty() {
            return Err(ControlError::config("template.url is not set"));
        }
        if self.vendor_account_id == 0 {
            return Err(ControlError::config("vendor_account_id is not set"));
        }

        let mut parameters = Vec::with_capacity(TEMPLATE_PARAMETER_KEYS.len() + 1);
        parameters.push(TemplateParameter::new(
            VENDOR_ACCOUNT_PARAMETER,
            self.vendor_account_id.to_string(),
        ));
        for key in TEMPLATE_PARAMETER_KEYS {
            let value = self
                .parameters
                .get(key)
                .ok_or_else(|| ControlError::config(format!("template parameter {key} is not set")))?;
            parameters.push(TemplateParameter::new(key, value.clone()));
        }

        Ok(DeploymentTemplate {
            name: TemplateName::new(&self.template.name),
            url: self.template.url.clone(),
            description: self.template.description.clone(),
            parameters,
            capabilities: self.template.capabilities.clone(),
            administration_role_arn: format!(
                "arn:aws:iam::{}:role/{}",
                management_account, self.template.administration_role_name
            ),
            execution_role_name: self.template.execution_role_name.clone(),
        })
    }
}

/// Deployment template configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    /// Template (stack set) name.
    #[serde(default)]
    pub name: String,

    /// URL of the template body.
    #[serde(default)]
    pub url: String,

    /// Description attached on creation.
    #[serde(default = "default_description")]
    pub description: String,

    /// Administration role path, appended to the management account's IAM ARN.
    #[serde(default = "default_administration_role_name")]
    pub administration_role_name: String,

    /// Execution role assumed in each target account.
    #[serde(default = "default_execution_role_name")]
    pub execution_role_name: String,

    /// Capabilities acknowledged on creation.
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,
}

fn default_description() -> String {
    "Adds in New Relic integration to your aws accounts. Launch as Stack Set in your Control Tower landing zone management account.".to_owned()
}

fn default_administration_role_name() -> String {
    "service-role/AWSControlTowerStackSetRole".to_owned()
}

fn default_execution_role_name() -> String {
    "AWSControlTowerExecution".to_owned()
}

fn default_capabilities() -> Vec<String> {
    vec!["CAPABILITY_NAMED_IAM".to_owned()]
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            url: String::new(),
            description: default_description(),
            administration_role_name: default_administration_role_name(),
            execution_role_name: default_execution_role_name(),
            capabilities: default_capabilities(),
        }
    }
}

/// Fan-out topic configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FanOutConfig {
    /// Topic the first-launch fan-out message is published to.
    #[serde(default)]
    pub topic_arn: String,

    /// Comma-separated seed accounts.
    ///
    /// A single account arrives from the environment as a number, so both
    /// forms are accepted.
    #[serde(default, deserialize_with = "lenient_string")]
    pub seed_accounts: String,
}

/// Teardown behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct TeardownConfig {
    /// Interval between operation status polls, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Time reserved before the invocation deadline, in milliseconds.
    #[serde(default = "default_deadline_margin_ms")]
    pub deadline_margin_ms: u64,

    /// Keep the deployed stacks when deleting instances.
    #[serde(default)]
    pub retain_stacks: bool,
}

const fn default_poll_interval_secs() -> u64 {
    30
}

const fn default_deadline_margin_ms() -> u64 {
    100
}

impl TeardownConfig {
    /// Poll interval as a duration.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Deadline margin as a duration.
    #[must_use]
    pub const fn deadline_margin(&self) -> Duration {
        Duration::from_millis(self.deadline_margin_ms)
    }
}

impl Default for TeardownConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            deadline_margin_ms: default_deadline_margin_ms(),
            retain_stacks: false,
        }
    }
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

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Text(String),
        Number(u64),
    }

    Ok(match Lenient::deserialize(deserializer)? {
        Lenient::Text(s) => s,
        Lenient::Number(n) => n.to_string(),
    })
}
