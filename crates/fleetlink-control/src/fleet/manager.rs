//! Core fleet deployment logic.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use fleetlink_proto::{AccountId, FanOutMessage, Region};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::TeardownConfig;
use crate::error::{ControlError, ControlResult};
use crate::provisioner::FleetProvisioner;
use crate::topic::TopicPublisher;
use crate::types::{
    DeploymentInstance, DeploymentTemplate, EnsureOutcome, FanOutResult, OperationId, OperationStatus,
    Reconciliation, TeardownOutcome, TeardownReport, TeardownStage, TemplateName,
};

/// Orchestrates the fleet-wide deployment template.
pub struct FleetManager {
    provisioner: Arc<dyn FleetProvisioner>,
    publisher: Arc<dyn TopicPublisher>,
    topic_arn: String,
    teardown: TeardownConfig,
}

impl FleetManager {
    /// Create a new fleet manager.
    pub fn new(
        provisioner: Arc<dyn FleetProvisioner>,
        publisher: Arc<dyn TopicPublisher>,
        topic_arn: impl Into<String>,
        teardown: TeardownConfig,
    ) -> Self {
        Self {
            provisioner,
            publisher,
            topic_arn: topic_arn.into(),
            teardown,
        }
    }

    /// Make sure the template exists, creating it if absent.
    ///
    /// `created` is true only when this call performed the creation. A
    /// template that cannot be described right after creation is a fatal
    /// [`ControlError::TemplateNotFound`].
    pub async fn ensure_template(
        &self,
        template: &DeploymentTemplate,
    ) -> ControlResult<EnsureOutcome> {
        let name = &template.name;

        if let Some(summary) = self.provisioner.describe_template(name).await? {
            info!(
                template = %name,
                status = summary.status.as_deref().unwrap_or("unknown"),
                "deployment template already exists"
            );
            return Ok(EnsureOutcome {
                created: false,
                name: name.clone(),
            });
        }

        info!(template = %name, url = %template.url, "creating deployment template");
        self.provisioner.create_template(template).await?;

        if self.provisioner.describe_template(name).await?.is_none() {
            error!(template = %name, "deployment template missing after creation");
            return Err(ControlError::TemplateNotFound(name.to_string()));
        }

        info!(template = %name, "deployment template created");
        Ok(EnsureOutcome {
            created: true,
            name: name.clone(),
        })
    }

    /// Publish the first-launch fan-out message.
    ///
    /// Publishes only when `created` is true and there is at least one seed
    /// account. A publish failure is logged and reported, never raised.
    pub async fn fan_out_if_first_launch(
        &self,
        created: bool,
        template: &TemplateName,
        seed_accounts: &[AccountId],
        region: &Region,
    ) -> FanOutResult {
        if !created {
            debug!(template = %template, "template pre-existed, no fan-out");
            return FanOutResult::Skipped {
                reason: "template already existed",
            };
        }

        if seed_accounts.is_empty() {
            info!(template = %template, "no seed accounts, no fan-out");
            return FanOutResult::Skipped {
                reason: "no seed accounts",
            };
        }

        let message = FanOutMessage::single(
            template.as_str(),
            seed_accounts.iter().cloned(),
            region.clone(),
        );

        let body = match message.to_json() {
            Ok(body) => body,
            Err(e) => {
                error!(template = %template, error = %e, "failed to encode fan-out message");
                return FanOutResult::Failed {
                    error: e.to_string(),
                };
            }
        };

        match self.publisher.publish(&self.topic_arn, &body).await {
            Ok(message_id) => {
                info!(
                    template = %template,
                    accounts = seed_accounts.len(),
                    region = %region,
                    message_id = %message_id,
                    "queued fan-out for instance creation"
                );
                FanOutResult::Published { message_id }
            }
            Err(e) => {
                error!(template = %template, error = %e, "failed to publish fan-out message");
                FanOutResult::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Ensure the template, then fan out on first creation.
    ///
    /// Safe to repeat: only the call that creates the template publishes.
    pub async fn reconcile(
        &self,
        template: &DeploymentTemplate,
        seed_accounts: &[AccountId],
        region: &Region,
    ) -> ControlResult<Reconciliation> {
        let ensure = self.ensure_template(template).await?;
        let fan_out = self
            .fan_out_if_first_launch(ensure.created, &ensure.name, seed_accounts, region)
            .await;

        Ok(Reconciliation { ensure, fan_out })
    }

    /// Delete every instance of the template, then the template itself.
    ///
    /// Waits for instance deletion at most `budget`. Never fails; problems are
    /// logged and reported through the outcome.
    pub async fn teardown(&self, name: &TemplateName, budget: Duration) -> TeardownOutcome {
        match self.provisioner.describe_template(name).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                info!(template = %name, "deployment template not found, nothing to tear down");
                return TeardownOutcome::NotFound;
            }
            Err(e) => return aborted(name, TeardownStage::Describe, &e),
        }

        let instances = match self.provisioner.list_instances(name).await {
            Ok(instances) => instances,
            Err(e) => return aborted(name, TeardownStage::ListInstances, &e),
        };

        let (accounts, regions) = collapse_targets(&instances);
        let mut report = TeardownReport {
            accounts,
            regions,
            ..TeardownReport::default()
        };

        info!(
            template = %name,
            accounts = ?report.accounts,
            regions = ?report.regions,
            "deployment instances found"
        );

        if !report.accounts.is_empty() {
            let operation = match self
                .provisioner
                .delete_instances(
                    name,
                    &report.accounts,
                    &report.regions,
                    self.teardown.retain_stacks,
                )
                .await
            {
                Ok(operation) => operation,
                Err(e) => return aborted(name, TeardownStage::DeleteInstances, &e),
            };

            info!(template = %name, operation = %operation, "instance deletion started");

            match self.wait_for_operation(name, &operation, budget).await {
                Ok((status, polls)) => {
                    report.final_status = Some(status);
                    report.polls = polls;
                }
                Err(e) => return aborted(name, TeardownStage::PollOperation, &e),
            }
            report.operation = Some(operation);
        }

        match self.provisioner.delete_template(name).await {
            Ok(()) => {
                info!(template = %name, "deployment template deleted");
                report.template_deleted = true;
            }
            Err(e) => {
                warn!(template = %name, error = %e, "deployment template still exists");
            }
        }

        TeardownOutcome::Completed(report)
    }

    /// Poll an operation until it is terminal or the budget is spent.
    async fn wait_for_operation(
        &self,
        name: &TemplateName,
        operation: &OperationId,
        budget: Duration,
    ) -> ControlResult<(OperationStatus, u32)> {
        let started = Instant::now();
        let interval = self.teardown.poll_interval();
        let mut polls = 0;
        let mut status = self.provisioner.describe_operation(name, operation).await?;

        while !status.is_terminal() {
            let remaining = budget.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                warn!(
                    template = %name,
                    operation = %operation,
                    status = ?status,
                    "wait budget exhausted, instance deletion may still be running"
                );
                break;
            }

            tokio::time::sleep(interval.min(remaining)).await;
            status = self.provisioner.describe_operation(name, operation).await?;
            polls += 1;
            debug!(operation = %operation, status = ?status, polls, "instance deletion status");
        }

        Ok((status, polls))
    }
}

fn aborted(name: &TemplateName, stage: TeardownStage, error: &ControlError) -> TeardownOutcome {
    error!(template = %name, stage = ?stage, error = %error, "teardown aborted");
    TeardownOutcome::Aborted {
        stage,
        error: error.to_string(),
    }
}

/// Accounts and regions covered by a set of instances.
fn collapse_targets<'a>(
    instances: impl IntoIterator<Item = &'a DeploymentInstance>,
) -> (BTreeSet<AccountId>, BTreeSet<Region>) {
    instances
        .into_iter()
        .map(|i| (i.account.clone(), i.region.clone()))
        .unzip()
}
