//! Core types for fleetlink-control.

use std::collections::BTreeSet;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fleetlink_proto::{AccountId, Region};
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Name of a fleet-wide deployment template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateName(String);

impl TemplateName {
    /// Create a new template name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TemplateName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One key/value parameter passed to the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateParameter {
    /// Parameter key declared by the template.
    pub key: String,
    /// Parameter value.
    pub value: String,
}

impl TemplateParameter {
    /// Create a parameter.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A fleet-wide deployment template.
///
/// Created once and never mutated in place; the manager only creates and
/// deletes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTemplate {
    /// Template name.
    pub name: TemplateName,
    /// URL of the template body.
    pub url: String,
    /// Description shown by the provisioning service.
    pub description: String,
    /// Ordered parameter set.
    pub parameters: Vec<TemplateParameter>,
    /// Capability flags acknowledged on creation (e.g. `CAPABILITY_NAMED_IAM`).
    pub capabilities: Vec<String>,
    /// Role the provisioning service assumes in the management account.
    pub administration_role_arn: String,
    /// Role the provisioning service assumes in each target account.
    pub execution_role_name: String,
}

/// Summary returned when describing a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSummary {
    /// Template name.
    pub name: TemplateName,
    /// Provider-specific status, if reported.
    pub status: Option<String>,
}

/// One realised deployment of a template in an account and region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentInstance {
    /// Template the instance belongs to.
    pub template: TemplateName,
    /// Target account.
    pub account: AccountId,
    /// Target region.
    pub region: Region,
    /// Provider-specific status, if reported.
    pub status: Option<String>,
}

/// Identifier of an asynchronous provisioning operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    /// Create a new operation id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of an asynchronous provisioning operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// Accepted, not started.
    Queued,
    /// In progress.
    Running,
    /// Being stopped.
    Stopping,
    /// Completed successfully.
    Succeeded,
    /// Completed with failures.
    Failed,
    /// Stopped before completion.
    Stopped,
    /// Status not recognised.
    Unknown,
}

impl OperationStatus {
    /// Parse from the provider's upper-case status string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "QUEUED" => Self::Queued,
            "RUNNING" => Self::Running,
            "STOPPING" => Self::Stopping,
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "STOPPED" => Self::Stopped,
            _ => Self::Unknown,
        }
    }

    /// Returns true once the operation can no longer change.
    ///
    /// An unrecognised status is treated as terminal so that polling stops.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Queued | Self::Running | Self::Stopping)
    }
}

/// Result of [`crate::FleetManager::ensure_template`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsureOutcome {
    /// True only when this call performed the first-time creation.
    pub created: bool,
    /// Template name.
    pub name: TemplateName,
}

/// Result of [`crate::FleetManager::fan_out_if_first_launch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FanOutResult {
    /// A fan-out message was published.
    Published {
        /// Message id assigned by the topic.
        message_id: String,
    },
    /// Nothing to publish.
    Skipped {
        /// Why the fan-out was skipped.
        reason: &'static str,
    },
    /// Publishing failed; the failure was logged and swallowed.
    Failed {
        /// The publish error.
        error: String,
    },
}

/// Result of [`crate::FleetManager::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Template existence check and creation.
    pub ensure: EnsureOutcome,
    /// First-launch fan-out.
    pub fan_out: FanOutResult,
}

/// Stage at which a teardown stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStage {
    /// Checking whether the template exists.
    Describe,
    /// Listing instances.
    ListInstances,
    /// Requesting instance deletion.
    DeleteInstances,
    /// Polling the deletion operation.
    PollOperation,
}

/// What a completed teardown did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TeardownReport {
    /// Accounts instances were deleted from.
    pub accounts: BTreeSet<AccountId>,
    /// Regions instances were deleted from.
    pub regions: BTreeSet<Region>,
    /// Deletion operation, when instances existed.
    pub operation: Option<OperationId>,
    /// Last observed operation status.
    pub final_status: Option<OperationStatus>,
    /// Status polls performed after the first check.
    pub polls: u32,
    /// Whether the template itself was deleted.
    pub template_deleted: bool,
}

/// Result of [`crate::FleetManager::teardown`]. Teardown never fails the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownOutcome {
    /// The template did not exist; nothing was done.
    NotFound,
    /// All stages ran.
    Completed(TeardownReport),
    /// A stage failed; later stages were skipped.
    Aborted {
        /// Stage that failed.
        stage: TeardownStage,
        /// The failure.
        error: String,
    },
}

/// Facts about the current invocation.
///
/// Region and management account come from the invoked function ARN
/// (`arn:aws:lambda:<region>:<account>:function:<name>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    /// Region the handler runs in.
    pub region: Region,
    /// Management account the handler runs in.
    pub account: AccountId,
    /// Point in time the invocation is cut off.
    pub deadline: SystemTime,
}

impl InvocationContext {
    /// Build a context from a function ARN and a deadline.
    pub fn from_function_arn(function_arn: &str, deadline: SystemTime) -> ControlResult<Self> {
        let parts: Vec<&str> = function_arn.split(':').collect();
        let (Some(region), Some(account)) = (parts.get(3), parts.get(4)) else {
            return Err(ControlError::InvalidContext(format!(
                "function ARN has too few segments: {function_arn}"
            )));
        };

        if region.is_empty() {
            return Err(ControlError::InvalidContext(format!(
                "function ARN has no region: {function_arn}"
            )));
        }

        Ok(Self {
            region: Region::new(*region),
            account: AccountId::parse(*account)?,
            deadline,
        })
    }

    /// Build a context from a function ARN and a deadline in epoch milliseconds.
    pub fn from_deadline_millis(function_arn: &str, deadline_ms: u64) -> ControlResult<Self> {
        Self::from_function_arn(function_arn, UNIX_EPOCH + Duration::from_millis(deadline_ms))
    }

    /// Time left before the deadline, zero once it has passed.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline
            .duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO)
    }
}
