//! Invocation entry point for the fleet deployment manager.

use std::sync::Arc;

use aws_config::BehaviorVersion;
use fleetlink_proto::{HttpResponder, LifecycleRequest};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::ControlConfig;
use crate::error::{ControlError, ControlResult};
use crate::fleet::FleetManager;
use crate::lifecycle::LifecycleHandler;
use crate::provisioner::CloudFormationProvisioner;
use crate::topic::SnsPublisher;
use crate::types::InvocationContext;

/// Routes raw invocation payloads to the lifecycle handler.
pub struct ControlService {
    handler: LifecycleHandler,
}

impl ControlService {
    /// Wrap an existing handler.
    pub fn new(handler: LifecycleHandler) -> Self {
        Self { handler }
    }

    /// Build the service with AWS clients from the ambient SDK configuration.
    pub async fn from_config(config: ControlConfig) -> ControlResult<Self> {
        let sdk = aws_config::load_defaults(BehaviorVersion::latest()).await;

        let provisioner = Arc::new(CloudFormationProvisioner::from_conf(&sdk));
        let publisher = Arc::new(SnsPublisher::from_conf(&sdk));
        let responder = Arc::new(HttpResponder::new(config.lifecycle.response_timeout())?);

        let manager = FleetManager::new(
            provisioner,
            publisher,
            config.fan_out.topic_arn.clone(),
            config.teardown.clone(),
        );

        Ok(Self::new(LifecycleHandler::new(config, manager, responder)))
    }

    /// Handle one invocation payload.
    ///
    /// Payloads without a `RequestType` are not lifecycle requests and are
    /// ignored. Returns the lifecycle response that was sent, or `null`.
    pub async fn invoke(&self, event: Value, ctx: &InvocationContext) -> ControlResult<Value> {
        debug!(event = %event, "invocation received");

        if event.get("RequestType").is_none() {
            info!("event is not a lifecycle request, ignoring");
            return Ok(Value::Null);
        }

        let request = match LifecycleRequest::from_value(event.clone()) {
            Ok(request) => request,
            Err(e) => return self.reject(&event, e.into()).await,
        };
        let response = self.handler.handle(&request, ctx).await?;
        Ok(serde_json::to_value(response)?)
    }

    /// Handle one invocation, deriving the context from the function ARN.
    ///
    /// A lifecycle request is answered FAILED if the context cannot be built.
    pub async fn invoke_with_arn(
        &self,
        event: Value,
        function_arn: &str,
        deadline_ms: u64,
    ) -> ControlResult<Value> {
        match InvocationContext::from_deadline_millis(function_arn, deadline_ms) {
            Ok(ctx) => self.invoke(event, &ctx).await,
            Err(e) if event.get("RequestType").is_some() => self.reject(&event, e).await,
            Err(e) => Err(e),
        }
    }

    async fn reject(&self, event: &Value, cause: ControlError) -> ControlResult<Value> {
        error!(error = %cause, "lifecycle request cannot be handled");
        match self.handler.reject(event, &cause).await? {
            Some(response) => Ok(serde_json::to_value(response)?),
            None => Err(cause),
        }
    }
}
