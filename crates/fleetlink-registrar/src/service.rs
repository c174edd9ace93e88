//! Invocation entry point for the account registrar.

use std::sync::Arc;

use aws_config::BehaviorVersion;
use fleetlink_proto::{HttpResponder, QueueBatch};
use fleetlink_secrets::SecretsProvider;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::RegistrarConfig;
use crate::dead_letter::SqsDeadLetterQueue;
use crate::error::RegistrarResult;
use crate::registrar::Registrar;
use crate::types::BatchReport;
use crate::vendor::GraphQlClient;

/// Routes raw invocation payloads to the registrar.
pub struct RegistrarService {
    registrar: Registrar,
}

impl RegistrarService {
    /// Wrap an existing registrar.
    pub fn new(registrar: Registrar) -> Self {
        Self { registrar }
    }

    /// Build the service with AWS and HTTP clients.
    ///
    /// Fails if the configuration does not name a vendor account, a
    /// credential secret and a dead-letter queue.
    pub async fn from_config(config: RegistrarConfig) -> RegistrarResult<Self> {
        config.validate()?;

        let sdk = aws_config::load_defaults(BehaviorVersion::latest()).await;

        let secrets = SecretsProvider::from_config(&config.secrets)
            .await?
            .backend()?;
        let vendor = Arc::new(GraphQlClient::new(
            config.vendor.endpoint.clone(),
            config.vendor.timeout(),
        )?);
        let dead_letter = Arc::new(SqsDeadLetterQueue::from_conf(
            &sdk,
            config.dead_letter.queue_url.clone(),
        ));
        let responder = Arc::new(HttpResponder::new(config.lifecycle.response_timeout())?);

        Ok(Self::new(Registrar::new(
            secrets,
            vendor,
            dead_letter,
            responder,
            config.vendor,
        )))
    }

    /// The wrapped registrar.
    pub fn registrar(&self) -> &Registrar {
        &self.registrar
    }

    /// Handle one invocation payload.
    ///
    /// Queue batches (`Records`) are processed record by record. A bare
    /// lifecycle request is handled as a single message. Anything else is
    /// ignored. Returns the batch report as JSON.
    pub async fn invoke(&self, event: Value) -> RegistrarResult<Value> {
        debug!(event = %event, "invocation received");

        if event.get("Records").is_some() {
            let batch = QueueBatch::from_value(event)?;
            let report = self.registrar.handle_batch(&batch).await;
            return Ok(serde_json::to_value(report)?);
        }

        if event.get("RequestType").is_some() {
            let body = serde_json::to_string(&event)?;
            let outcome = self.registrar.handle_message(&body).await;
            let mut report = BatchReport::default();
            report.record(&outcome);
            return Ok(serde_json::to_value(report)?);
        }

        info!("event carries no records, ignoring");
        Ok(Value::Null)
    }
}
