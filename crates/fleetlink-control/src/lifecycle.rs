//! Custom-resource lifecycle handling.
//!
//! `Create` and `Update` reconcile the template, `Delete` tears it down.
//! Every request is answered on its response URL.

use std::sync::Arc;

use fleetlink_proto::{LifecycleRequest, LifecycleResponder, LifecycleResponse, RequestType};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::ControlConfig;
use crate::error::{ControlError, ControlResult};
use crate::fleet::FleetManager;
use crate::types::{InvocationContext, Reconciliation, TeardownOutcome, TemplateName};

/// Data key carrying the template name in a success response.
pub const RESULT_KEY: &str = "result";

/// Answers lifecycle requests for the fleet deployment template.
pub struct LifecycleHandler {
    config: ControlConfig,
    manager: FleetManager,
    responder: Arc<dyn LifecycleResponder>,
}

impl LifecycleHandler {
    /// Create a new handler.
    pub fn new(
        config: ControlConfig,
        manager: FleetManager,
        responder: Arc<dyn LifecycleResponder>,
    ) -> Self {
        Self {
            config,
            manager,
            responder,
        }
    }

    /// Handle one request and deliver the response.
    ///
    /// Returns the response that was sent. Only a failed delivery is an error;
    /// workflow failures are reported through a `FAILED` response.
    pub async fn handle(
        &self,
        request: &LifecycleRequest,
        ctx: &InvocationContext,
    ) -> ControlResult<LifecycleResponse> {
        info!(
            request_type = %request.request_type,
            request_id = %request.request_id,
            logical_resource_id = %request.logical_resource_id,
            "lifecycle request received"
        );

        let physical_id = request.physical_resource_id_or_generate();

        let response = match &request.request_type {
            RequestType::Create | RequestType::Update => match self.reconcile(ctx).await {
                Ok(reconciliation) => {
                    info!(
                        template = %reconciliation.ensure.name,
                        created = reconciliation.ensure.created,
                        fan_out = ?reconciliation.fan_out,
                        "deployment template reconciled"
                    );
                    LifecycleResponse::success(request, physical_id)
                        .with_data(RESULT_KEY, reconciliation.ensure.name.to_string())
                }
                Err(e) => {
                    error!(error = %e, "reconciliation failed");
                    LifecycleResponse::failed(request, physical_id, e.to_string())
                }
            },
            RequestType::Delete => {
                let outcome = self.teardown(ctx).await;
                info!(outcome = ?outcome, "teardown finished");
                LifecycleResponse::success(request, physical_id)
            }
            RequestType::Other(other) => {
                warn!(request_type = %other, "unsupported lifecycle request type");
                LifecycleResponse::failed(
                    request,
                    physical_id,
                    format!("unsupported request type: {other}"),
                )
            }
        };

        match request.response_url.as_deref() {
            Some(url) => self.responder.respond(url, &response).await?,
            None => warn!(request_id = %request.request_id, "no response URL, response not sent"),
        }

        Ok(response)
    }

    /// Answer FAILED to an event that cannot be handled.
    ///
    /// Returns `None` when the event carries no response URL.
    pub async fn reject(
        &self,
        event: &Value,
        error: &ControlError,
    ) -> ControlResult<Option<LifecycleResponse>> {
        let Some(url) = LifecycleRequest::response_url_of(event) else {
            warn!(error = %error, "unanswerable lifecycle request, no response URL");
            return Ok(None);
        };

        let response = LifecycleResponse::failed_raw(event, error.to_string());
        self.responder.respond(url, &response).await?;
        Ok(Some(response))
    }

    async fn reconcile(&self, ctx: &InvocationContext) -> ControlResult<Reconciliation> {
        let template = self.config.template(&ctx.account)?;
        let seeds = self.config.seed_accounts()?;
        self.manager.reconcile(&template, &seeds, &ctx.region).await
    }

    async fn teardown(&self, ctx: &InvocationContext) -> TeardownOutcome {
        let name = TemplateName::new(&self.config.template.name);
        let budget = ctx
            .remaining()
            .saturating_sub(self.config.teardown.deadline_margin());
        self.manager.teardown(&name, budget).await
    }
}
