//! Core types for fleetlink-registrar.

use std::collections::{BTreeMap, BTreeSet};

use fleetlink_proto::AccountId;
use serde::Serialize;

use crate::error::{RegistrarError, RegistrarResult};
use crate::graphql::{IntegrationsInput, LinkedAccountRef};

/// Integration slugs available for configuration.
///
/// Never empty: a catalog can only be built from at least one slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationCatalog(BTreeSet<String>);

impl IntegrationCatalog {
    /// Build a catalog from slugs, de-duplicating them.
    pub fn new(slugs: impl IntoIterator<Item = impl Into<String>>) -> RegistrarResult<Self> {
        let slugs: BTreeSet<String> = slugs
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| !s.is_empty())
            .collect();

        if slugs.is_empty() {
            return Err(RegistrarError::schema("integration catalog is empty"));
        }

        Ok(Self(slugs))
    }

    /// Slugs in sorted order.
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of slugs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no slugs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Configure input enabling every slug for one linked account.
    #[must_use]
    pub fn integrations_for(&self, linked_account_id: u64) -> IntegrationsInput {
        let aws: BTreeMap<String, Vec<LinkedAccountRef>> = self
            .0
            .iter()
            .map(|slug| (slug.clone(), vec![LinkedAccountRef { linked_account_id }]))
            .collect();
        IntegrationsInput { aws }
    }
}

/// Outcome of registering one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Linked and configured.
    Configured {
        /// Vendor-assigned linked account id.
        linked_account_id: u64,
        /// Integrations the vendor reported as enabled.
        integrations: usize,
        /// Per-integration errors reported by the vendor.
        errors: usize,
    },
    /// The account was linked before; nothing was configured.
    AlreadyLinked,
}

/// Outcome of handling one queue message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Every account in the message was registered.
    Registered {
        /// Outcome per account, in processing order.
        accounts: Vec<(AccountId, RegistrationOutcome)>,
    },
    /// The message required no registration.
    Skipped {
        /// Why it was skipped.
        reason: String,
    },
    /// Registration failed and the message went to the dead-letter queue.
    DeadLettered {
        /// The failure.
        error: String,
        /// Whether the dead-letter send itself succeeded.
        delivered: bool,
    },
}

/// Counts for one queue batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Records in the batch.
    pub messages: usize,
    /// Accounts linked and configured.
    pub registered: usize,
    /// Accounts found already linked.
    pub already_linked: usize,
    /// Messages that needed no registration.
    pub skipped: usize,
    /// Messages sent to the dead-letter queue.
    pub dead_lettered: usize,
}

impl BatchReport {
    /// Fold one message outcome into the counts.
    pub fn record(&mut self, outcome: &MessageOutcome) {
        self.messages += 1;
        match outcome {
            MessageOutcome::Registered { accounts } => {
                for (_, outcome) in accounts {
                    match outcome {
                        RegistrationOutcome::Configured { .. } => self.registered += 1,
                        RegistrationOutcome::AlreadyLinked => self.already_linked += 1,
                    }
                }
            }
            MessageOutcome::Skipped { .. } => self.skipped += 1,
            MessageOutcome::DeadLettered { .. } => self.dead_lettered += 1,
        }
    }
}
