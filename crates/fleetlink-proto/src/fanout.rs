//! Fan-out messages published when a deployment template is first created.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::ProtocolResult;
use crate::types::{AccountId, Region};

/// Accounts and regions a template should be deployed to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FanOutTarget {
    /// Target accounts.
    #[serde(default)]
    pub target_accounts: BTreeSet<AccountId>,
    /// Target regions.
    #[serde(default)]
    pub target_regions: BTreeSet<Region>,
}

impl FanOutTarget {
    /// Returns true if the target names no account.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.target_accounts.is_empty()
    }
}

/// Instruction to deploy templates to a set of accounts and regions.
///
/// Serialised as a JSON object keyed by template name:
///
/// ```json
/// {"NR-Stack": {"target_accounts": ["111111111111"], "target_regions": ["us-east-1"]}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FanOutMessage(BTreeMap<String, FanOutTarget>);

impl FanOutMessage {
    /// Create an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a message for one template deployed to one region.
    #[must_use]
    pub fn single(
        template: impl Into<String>,
        accounts: impl IntoIterator<Item = AccountId>,
        region: Region,
    ) -> Self {
        let mut message = Self::new();
        message.insert(
            template,
            FanOutTarget {
                target_accounts: accounts.into_iter().collect(),
                target_regions: BTreeSet::from([region]),
            },
        );
        message
    }

    /// Add or replace the target for a template.
    pub fn insert(&mut self, template: impl Into<String>, target: FanOutTarget) {
        self.0.insert(template.into(), target);
    }

    /// Get the target for a template.
    #[must_use]
    pub fn target(&self, template: &str) -> Option<&FanOutTarget> {
        self.0.get(template)
    }

    /// Iterate over `(template, target)` pairs in template name order.
    pub fn targets(&self) -> impl Iterator<Item = (&str, &FanOutTarget)> {
        self.0.iter().map(|(name, target)| (name.as_str(), target))
    }

    /// All accounts named by any template, de-duplicated and sorted.
    #[must_use]
    pub fn accounts(&self) -> BTreeSet<&AccountId> {
        self.0
            .values()
            .flat_map(|target| target.target_accounts.iter())
            .collect()
    }

    /// Returns true if no template names any account.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(FanOutTarget::is_empty)
    }

    /// Serialise to the JSON wire form.
    pub fn to_json(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse from the JSON wire form.
    pub fn from_json(body: &str) -> ProtocolResult<Self> {
        Ok(serde_json::from_str(body)?)
    }
}
