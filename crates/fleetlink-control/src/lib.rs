//! Fleetlink fleet deployment manager.
//!
//! Keeps a fleet-wide deployment template (a CloudFormation StackSet) in
//! place for the lifetime of the custom resource that owns it.
//!
//! # Workflow
//!
//! - **Create / Update**: make sure the template exists. Only the call that
//!   actually creates it publishes a fan-out message naming the seed accounts
//!   and the current region, so repeating the request is harmless.
//! - **Delete**: delete every instance, wait for the deletion operation within
//!   the invocation's remaining time, then delete the template.
//!
//! ```text
//! describe ──absent──▶ create ──▶ describe ──▶ publish fan-out
//!    │                               │
//!  present                        absent
//!    ▼                               ▼
//!  no-op                    TemplateNotFound
//! ```
//!
//! External systems are reached through [`FleetProvisioner`] and
//! [`TopicPublisher`], each with an in-memory implementation for tests.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod fleet;
pub mod lifecycle;
pub mod provisioner;
pub mod service;
pub mod topic;
pub mod types;

// Re-export commonly used types at the crate root
pub use config::ControlConfig;
pub use error::{ControlError, ControlResult};
pub use fleet::FleetManager;
pub use lifecycle::LifecycleHandler;
pub use provisioner::{CloudFormationProvisioner, FleetProvisioner, MockProvisioner};
pub use service::ControlService;
pub use topic::{MemoryTopic, SnsPublisher, TopicPublisher};
pub use types::{
    DeploymentInstance, DeploymentTemplate, EnsureOutcome, FanOutResult, InvocationContext,
    OperationId, OperationStatus, Reconciliation, TeardownOutcome, TeardownReport, TeardownStage,
    TemplateName, TemplateParameter, TemplateSummary,
};
