//! AWS Secrets Manager backend.

use async_trait::async_trait;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::Client;

use crate::error::SecretsError;
use crate::traits::SecretsBackend;
use crate::types::SecretValue;

/// Reads secrets from AWS Secrets Manager.
///
/// Secrets are addressed by name or ARN. A missing secret is `Ok(None)`;
/// every other service failure is a [`SecretsError::Backend`].
#[derive(Debug, Clone)]
pub struct AwsSecrets {
    client: Client,
}

impl AwsSecrets {
    /// Wrap an existing client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from shared SDK configuration.
    #[must_use]
    pub fn from_conf(config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

#[async_trait]
impl SecretsBackend for AwsSecrets {
    async fn get(&self, id: &str) -> Result<Option<SecretValue>, SecretsError> {
        let result = self.client.get_secret_value().secret_id(id).send().await;

        match result {
            Ok(output) => {
                tracing::debug!(secret.id = id, secret.operation = "get", "secret fetched");

                if let Some(secret) = output.secret_string() {
                    return Ok(Some(SecretValue::new(secret)));
                }

                match output.secret_binary() {
                    Some(blob) => SecretValue::from_bytes(blob.as_ref())
                        .map(Some)
                        .map_err(|_| SecretsError::Malformed {
                            id: id.to_owned(),
                            reason: "binary secret is not UTF-8".to_owned(),
                        }),
                    None => Ok(None),
                }
            }
            Err(err) => {
                let not_found = err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception());

                if not_found {
                    Ok(None)
                } else {
                    Err(SecretsError::Backend(format!(
                        "get secret {id}: {}",
                        DisplayErrorContext(&err)
                    )))
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "aws"
    }
}
