//! SNS topic publisher.

use async_trait::async_trait;
use aws_sdk_sns::error::DisplayErrorContext;
use aws_sdk_sns::Client;

use super::TopicPublisher;
use crate::error::{ControlError, ControlResult};

/// Publishes to an SNS topic.
#[derive(Debug, Clone)]
pub struct SnsPublisher {
    client: Client,
}

impl SnsPublisher {
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
impl TopicPublisher for SnsPublisher {
    async fn publish(&self, topic: &str, message: &str) -> ControlResult<String> {
        let output = self
            .client
            .publish()
            .topic_arn(topic)
            .message(message)
            .send()
            .await
            .map_err(|e| ControlError::publish(format!("{topic}: {}", DisplayErrorContext(&e))))?;

        Ok(output.message_id().unwrap_or_default().to_owned())
    }
}
