//! CloudFormation StackSets provisioner.

use std::collections::BTreeSet;

use async_trait::async_trait;
use aws_sdk_cloudformation::error::DisplayErrorContext;
use aws_sdk_cloudformation::types::{Capability, Parameter};
use aws_sdk_cloudformation::Client;
use fleetlink_proto::{AccountId, Region};
use tracing::{debug, warn};

use super::FleetProvisioner;
use crate::error::{ControlError, ControlResult};
use crate::types::{
    DeploymentInstance, DeploymentTemplate, OperationId, OperationStatus, TemplateName,
    TemplateSummary,
};

/// Provisions templates as CloudFormation StackSets.
#[derive(Debug, Clone)]
pub struct CloudFormationProvisioner {
    client: Client,
}

impl CloudFormationProvisioner {
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
impl FleetProvisioner for CloudFormationProvisioner {
    async fn describe_template(
        &self,
        name: &TemplateName,
    ) -> ControlResult<Option<TemplateSummary>> {
        let result = self
            .client
            .describe_stack_set()
            .stack_set_name(name.as_str())
            .send()
            .await;

        match result {
            Ok(output) => {
                let status = output
                    .stack_set()
                    .and_then(|s| s.status())
                    .map(|s| s.as_str().to_owned());

                // Deleted stack sets stay describable for a while.
                if status.as_deref() == Some("DELETED") {
                    debug!(template = %name, "stack set is deleted");
                    return Ok(None);
                }

                Ok(Some(TemplateSummary {
                    name: name.clone(),
                    status,
                }))
            }
            Err(err) => {
                let not_found = err
                    .as_service_error()
                    .is_some_and(|e| e.is_stack_set_not_found_exception());

                if not_found {
                    Ok(None)
                } else {
                    Err(ControlError::provisioning(format!(
                        "describe stack set {name}: {}",
                        DisplayErrorContext(&err)
                    )))
                }
            }
        }
    }

    async fn create_template(&self, template: &DeploymentTemplate) -> ControlResult<()> {
        let parameters = template
            .parameters
            .iter()
            .map(|p| {
                Parameter::builder()
                    .parameter_key(&p.key)
                    .parameter_value(&p.value)
                    .use_previous_value(false)
                    .build()
            })
            .collect();

        let capabilities = template
            .capabilities
            .iter()
            .map(|c| Capability::from(c.as_str()))
            .collect();

        let output = self
            .client
            .create_stack_set()
            .stack_set_name(template.name.as_str())
            .description(&template.description)
            .template_url(&template.url)
            .set_parameters(Some(parameters))
            .set_capabilities(Some(capabilities))
            .administration_role_arn(&template.administration_role_arn)
            .execution_role_name(&template.execution_role_name)
            .send()
            .await
            .map_err(|e| {
                ControlError::provisioning(format!(
                    "create stack set {}: {}",
                    template.name,
                    DisplayErrorContext(&e)
                ))
            })?;

        debug!(
            template = %template.name,
            stack_set_id = output.stack_set_id().unwrap_or_default(),
            "stack set created"
        );

        Ok(())
    }

    async fn delete_template(&self, name: &TemplateName) -> ControlResult<()> {
        self.client
            .delete_stack_set()
            .stack_set_name(name.as_str())
            .send()
            .await
            .map_err(|e| {
                ControlError::provisioning(format!(
                    "delete stack set {name}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(())
    }

    async fn list_instances(&self, name: &TemplateName) -> ControlResult<Vec<DeploymentInstance>> {
        let mut instances = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_stack_instances()
                .stack_set_name(name.as_str())
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| {
                    ControlError::provisioning(format!(
                        "list stack instances {name}: {}",
                        DisplayErrorContext(&e)
                    ))
                })?;

            for summary in output.summaries() {
                let (Some(account), Some(region)) = (summary.account(), summary.region()) else {
                    warn!(template = %name, "stack instance without account or region");
                    continue;
                };

                instances.push(DeploymentInstance {
                    template: name.clone(),
                    account: AccountId::parse(account)?,
                    region: Region::new(region),
                    status: summary.status().map(|s| s.as_str().to_owned()),
                });
            }

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_owned()),
                _ => break,
            }
        }

        Ok(instances)
    }

    async fn delete_instances(
        &self,
        name: &TemplateName,
        accounts: &BTreeSet<AccountId>,
        regions: &BTreeSet<Region>,
        retain_stacks: bool,
    ) -> ControlResult<OperationId> {
        let output = self
            .client
            .delete_stack_instances()
            .stack_set_name(name.as_str())
            .set_accounts(Some(accounts.iter().map(ToString::to_string).collect()))
            .set_regions(Some(regions.iter().map(ToString::to_string).collect()))
            .retain_stacks(retain_stacks)
            .send()
            .await
            .map_err(|e| {
                ControlError::provisioning(format!(
                    "delete stack instances {name}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        output
            .operation_id()
            .map(OperationId::new)
            .ok_or_else(|| ControlError::provisioning("delete stack instances returned no operation id"))
    }

    async fn describe_operation(
        &self,
        name: &TemplateName,
        operation: &OperationId,
    ) -> ControlResult<OperationStatus> {
        let output = self
            .client
            .describe_stack_set_operation()
            .stack_set_name(name.as_str())
            .operation_id(operation.as_str())
            .send()
            .await
            .map_err(|e| {
                ControlError::provisioning(format!(
                    "describe stack set operation {operation}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(output
            .stack_set_operation()
            .and_then(|o| o.status())
            .map_or(OperationStatus::Unknown, |s| OperationStatus::parse(s.as_str())))
    }
}
