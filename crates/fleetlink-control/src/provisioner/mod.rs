//! Fleet provisioning API abstraction.
//!
//! The provisioning service owns templates, their per-account instances and
//! the asynchronous operations that create or delete them. The primary
//! implementation talks to CloudFormation StackSets.

mod cloudformation;

pub use cloudformation::CloudFormationProvisioner;

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use fleetlink_proto::{AccountId, Region};

use crate::error::{ControlError, ControlResult};
use crate::types::{
    DeploymentInstance, DeploymentTemplate, OperationId, OperationStatus, TemplateName,
    TemplateSummary,
};

/// Trait for fleet provisioning implementations.
#[async_trait]
pub trait FleetProvisioner: Send + Sync {
    /// Describe a template. Returns `None` when it does not exist.
    async fn describe_template(&self, name: &TemplateName)
        -> ControlResult<Option<TemplateSummary>>;

    /// Create a template with its full parameter, capability and role set.
    async fn create_template(&self, template: &DeploymentTemplate) -> ControlResult<()>;

    /// Delete a template. It must have no instances left.
    async fn delete_template(&self, name: &TemplateName) -> ControlResult<()>;

    /// List every instance of a template, across all pages.
    async fn list_instances(&self, name: &TemplateName) -> ControlResult<Vec<DeploymentInstance>>;

    /// Delete the instances in the cross product of `accounts` and `regions`.
    ///
    /// Returns the id of the asynchronous deletion operation.
    async fn delete_instances(
        &self,
        name: &TemplateName,
        accounts: &BTreeSet<AccountId>,
        regions: &BTreeSet<Region>,
        retain_stacks: bool,
    ) -> ControlResult<OperationId>;

    /// Current status of an operation.
    async fn describe_operation(
        &self,
        name: &TemplateName,
        operation: &OperationId,
    ) -> ControlResult<OperationStatus>;
}

/// A call recorded by [`MockProvisioner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionerCall {
    /// `describe_template`.
    DescribeTemplate(TemplateName),
    /// `create_template`.
    CreateTemplate(TemplateName),
    /// `delete_template`.
    DeleteTemplate(TemplateName),
    /// `list_instances`.
    ListInstances(TemplateName),
    /// `delete_instances`.
    DeleteInstances {
        /// Template name.
        name: TemplateName,
        /// Accounts requested.
        accounts: BTreeSet<AccountId>,
        /// Regions requested.
        regions: BTreeSet<Region>,
        /// Whether stacks were retained.
        retain_stacks: bool,
    },
    /// `describe_operation`.
    DescribeOperation(OperationId),
}

/// Mock provisioner for testing.
///
/// Operation statuses are served from a script, then `Succeeded` once the
/// script runs out.
#[derive(Debug, Default)]
pub struct MockProvisioner {
    templates: RwLock<HashMap<TemplateName, DeploymentTemplate>>,
    instances: RwLock<Vec<DeploymentInstance>>,
    statuses: RwLock<VecDeque<OperationStatus>>,
    calls: RwLock<Vec<ProvisionerCall>>,
    next_operation: AtomicU32,
    lose_created: AtomicBool,
    fail_describe: AtomicBool,
    fail_list: AtomicBool,
    fail_delete_template: AtomicBool,
}

impl MockProvisioner {
    /// Create an empty provisioner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing template.
    #[must_use]
    pub fn with_template(self, template: DeploymentTemplate) -> Self {
        if let Ok(mut templates) = self.templates.write() {
            templates.insert(template.name.clone(), template);
        }
        self
    }

    /// Seed an existing instance.
    #[must_use]
    pub fn with_instance(self, instance: DeploymentInstance) -> Self {
        if let Ok(mut instances) = self.instances.write() {
            instances.push(instance);
        }
        self
    }

    /// Script the statuses returned by `describe_operation`.
    #[must_use]
    pub fn with_operation_statuses(self, statuses: impl IntoIterator<Item = OperationStatus>) -> Self {
        if let Ok(mut script) = self.statuses.write() {
            script.extend(statuses);
        }
        self
    }

    /// Accept creates without storing the template.
    #[must_use]
    pub fn losing_created_templates(self) -> Self {
        self.lose_created.store(true, Ordering::SeqCst);
        self
    }

    /// Fail every `describe_template` call.
    #[must_use]
    pub fn failing_describe(self) -> Self {
        self.fail_describe.store(true, Ordering::SeqCst);
        self
    }

    /// Fail every `list_instances` call.
    #[must_use]
    pub fn failing_list(self) -> Self {
        self.fail_list.store(true, Ordering::SeqCst);
        self
    }

    /// Fail every `delete_template` call.
    #[must_use]
    pub fn failing_template_delete(self) -> Self {
        self.fail_delete_template.store(true, Ordering::SeqCst);
        self
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> ControlResult<Vec<ProvisionerCall>> {
        Ok(self
            .calls
            .read()
            .map_err(|_| ControlError::internal("lock poisoned"))?
            .clone())
    }

    /// Whether a template currently exists.
    pub fn has_template(&self, name: &TemplateName) -> ControlResult<bool> {
        Ok(self
            .templates
            .read()
            .map_err(|_| ControlError::internal("lock poisoned"))?
            .contains_key(name))
    }

    /// Instances currently deployed.
    pub fn instances(&self) -> ControlResult<Vec<DeploymentInstance>> {
        Ok(self
            .instances
            .read()
            .map_err(|_| ControlError::internal("lock poisoned"))?
            .clone())
    }

    fn record(&self, call: ProvisionerCall) -> ControlResult<()> {
        self.calls
            .write()
            .map_err(|_| ControlError::internal("lock poisoned"))?
            .push(call);
        Ok(())
    }
}

#[async_trait]
impl FleetProvisioner for MockProvisioner {
    async fn describe_template(
        &self,
        name: &TemplateName,
    ) -> ControlResult<Option<TemplateSummary>> {
        self.record(ProvisionerCall::DescribeTemplate(name.clone()))?;

        if self.fail_describe.load(Ordering::SeqCst) {
            return Err(ControlError::provisioning("describe failed"));
        }

        let templates = self
            .templates
            .read()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        Ok(templates.get(name).map(|t| TemplateSummary {
            name: t.name.clone(),
            status: Some("ACTIVE".to_owned()),
        }))
    }

    async fn create_template(&self, template: &DeploymentTemplate) -> ControlResult<()> {
        self.record(ProvisionerCall::CreateTemplate(template.name.clone()))?;

        let mut templates = self
            .templates
            .write()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        if templates.contains_key(&template.name) {
            return Err(ControlError::provisioning(format!(
                "template already exists: {}",
                template.name
            )));
        }

        if !self.lose_created.load(Ordering::SeqCst) {
            templates.insert(template.name.clone(), template.clone());
        }

        Ok(())
    }

    async fn delete_template(&self, name: &TemplateName) -> ControlResult<()> {
        self.record(ProvisionerCall::DeleteTemplate(name.clone()))?;

        if self.fail_delete_template.load(Ordering::SeqCst) {
            return Err(ControlError::provisioning("template delete failed"));
        }

        let instances = self
            .instances
            .read()
            .map_err(|_| ControlError::internal("lock poisoned"))?;
        if instances.iter().any(|i| &i.template == name) {
            return Err(ControlError::provisioning(format!(
                "template still has instances: {name}"
            )));
        }

        let mut templates = self
            .templates
            .write()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        if templates.remove(name).is_none() {
            return Err(ControlError::provisioning(format!(
                "template not found: {name}"
            )));
        }

        Ok(())
    }

    async fn list_instances(&self, name: &TemplateName) -> ControlResult<Vec<DeploymentInstance>> {
        self.record(ProvisionerCall::ListInstances(name.clone()))?;

        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ControlError::provisioning("list instances failed"));
        }

        let instances = self
            .instances
            .read()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        Ok(instances
            .iter()
            .filter(|i| &i.template == name)
            .cloned()
            .collect())
    }

    async fn delete_instances(
        &self,
        name: &TemplateName,
        accounts: &BTreeSet<AccountId>,
        regions: &BTreeSet<Region>,
        retain_stacks: bool,
    ) -> ControlResult<OperationId> {
        self.record(ProvisionerCall::DeleteInstances {
            name: name.clone(),
            accounts: accounts.clone(),
            regions: regions.clone(),
            retain_stacks,
        })?;

        let mut instances = self
            .instances
            .write()
            .map_err(|_| ControlError::internal("lock poisoned"))?;
        instances.retain(|i| {
            !(&i.template == name && accounts.contains(&i.account) && regions.contains(&i.region))
        });

        let n = self.next_operation.fetch_add(1, Ordering::SeqCst);
        Ok(OperationId::new(format!("op-{n}")))
    }

    async fn describe_operation(
        &self,
        _name: &TemplateName,
        operation: &OperationId,
    ) -> ControlResult<OperationStatus> {
        self.record(ProvisionerCall::DescribeOperation(operation.clone()))?;

        let mut statuses = self
            .statuses
            .write()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        Ok(statuses.pop_front().unwrap_or(OperationStatus::Succeeded))
    }
}
