//! SQS dead-letter queue.

use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::Client;
use tracing::debug;

use super::DeadLetterQueue;
use crate::error::{RegistrarError, RegistrarResult};

/// Sends failing messages to an SQS queue.
#[derive(Debug, Clone)]
pub struct SqsDeadLetterQueue {
    client: Client,
    queue_url: String,
}

impl SqsDeadLetterQueue {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    /// Build a client from shared SDK configuration.
    #[must_use]
    pub fn from_conf(config: &aws_config::SdkConfig, queue_url: impl Into<String>) -> Self {
        Self::new(Client::new(config), queue_url)
    }
}

#[async_trait]
impl DeadLetterQueue for SqsDeadLetterQueue {
    async fn send(&self, body: &str) -> RegistrarResult<()> {
        if self.queue_url.is_empty() {
            return Err(RegistrarError::dead_letter("no dead-letter queue configured"));
        }

        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| {
                RegistrarError::dead_letter(format!(
                    "{}: {}",
                    self.queue_url,
                    DisplayErrorContext(&e)
                ))
            })?;

        debug!(
            queue = %self.queue_url,
            message_id = output.message_id().unwrap_or_default(),
            "dead-letter message sent"
        );
        Ok(())
    }
}
