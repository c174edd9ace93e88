//! Environment variable secrets backend, for running the handlers locally.
//!
//! A secret id such as `arn:aws:secretsmanager:eu-west-1:1:secret:newrelic`
//! is folded into a variable name, so the same configuration works against
//! Secrets Manager in production and the shell environment on a laptop.

use std::env;
use std::ffi::OsString;

use async_trait::async_trait;

use crate::error::SecretsError;
use crate::traits::SecretsBackend;
use crate::types::SecretValue;

const DEFAULT_PREFIX: &str = "FLEETLINK_SECRET";

/// Reads secrets from `{PREFIX}_{ID}` variables.
///
/// The id is upper-cased and every character outside `[A-Z0-9]` becomes
/// `_`, so `newrelic/api-key` is read from `FLEETLINK_SECRET_NEWRELIC_API_KEY`.
#[derive(Debug, Clone)]
pub struct EnvSecrets {
    prefix: String,
}

impl Default for EnvSecrets {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }
}

impl EnvSecrets {
    /// Backend using the `FLEETLINK_SECRET` prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend using a custom prefix.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The variable prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Variable a secret id is read from.
    #[must_use]
    pub fn variable_for(&self, id: &str) -> String {
        let mut name = String::with_capacity(self.prefix.len() + 1 + id.len());
        name.push_str(&self.prefix);
        name.push('_');
        name.extend(id.chars().map(|c| match c {
            'a'..='z' => c.to_ascii_uppercase(),
            'A'..='Z' | '0'..='9' => c,
            _ => '_',
        }));
        name
    }
}

#[async_trait]
impl SecretsBackend for EnvSecrets {
    async fn get(&self, id: &str) -> Result<Option<SecretValue>, SecretsError> {
        let variable = self.variable_for(id);

        let Some(raw) = env::var_os(&variable) else {
            tracing::debug!(secret.id = id, secret.env_var = %variable, "secret variable not set");
            return Ok(None);
        };

        match OsString::into_string(raw) {
            Ok(value) => Ok(Some(SecretValue::new(value))),
            Err(_) => Err(SecretsError::Malformed {
                id: id.to_owned(),
                reason: format!("{variable} is not valid UTF-8"),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "env"
    }
}
