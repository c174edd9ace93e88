//! Typestate for the registration of one account.
//!
//! ```text
//! Received ──▶ CredentialFetched ──▶ SchemaDiscovered ──▶ Linked ──▶ Configured
//!    │                 │                    │      │          │
//!    │                 │                    │      └──────────┼──▶ Configured (already linked)
//!    ▼                 ▼                    ▼                 ▼
//!                          DeadLettered
//! ```
//!
//! Each state carries exactly what later steps need, so a step cannot run
//! without its inputs.

use std::fmt;

use fleetlink_proto::AccountId;

use crate::credential::VendorCredential;
use crate::error::RegistrarError;
use crate::types::{IntegrationCatalog, RegistrationOutcome};

/// Stage names, for logging and failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStage {
    /// Message accepted.
    Received,
    /// Credential read from the secret store.
    CredentialFetched,
    /// Integration catalog discovered.
    SchemaDiscovered,
    /// Account linked to the vendor.
    Linked,
    /// Integrations configured, or the account was already linked.
    Configured,
    /// Sent to the dead-letter queue.
    DeadLettered,
}

impl RegistrationStage {
    /// Stage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::CredentialFetched => "credential_fetched",
            Self::SchemaDiscovered => "schema_discovered",
            Self::Linked => "linked",
            Self::Configured => "configured",
            Self::DeadLettered => "dead_lettered",
        }
    }
}

impl fmt::Display for RegistrationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker trait for registration states.
pub trait RegistrationState: private::Sealed + Send + Sync {
    /// The stage this state represents.
    fn stage() -> RegistrationStage;
}

mod private {
    pub trait Sealed {}
}

/// Message accepted, nothing fetched yet.
#[derive(Debug)]
pub struct Received;

/// Credential available.
#[derive(Debug)]
pub struct CredentialFetched {
    credential: VendorCredential,
}

/// Credential and catalog available.
#[derive(Debug)]
pub struct SchemaDiscovered {
    credential: VendorCredential,
    catalog: IntegrationCatalog,
}

/// Account linked; integrations not yet configured.
#[derive(Debug)]
pub struct Linked {
    credential: VendorCredential,
    catalog: IntegrationCatalog,
    linked_account_id: u64,
}

/// Terminal success.
#[derive(Debug)]
pub struct Configured {
    outcome: RegistrationOutcome,
}

/// Terminal failure.
#[derive(Debug)]
pub struct DeadLettered {
    from: RegistrationStage,
    error: String,
}

impl private::Sealed for Received {}
impl private::Sealed for CredentialFetched {}
impl private::Sealed for SchemaDiscovered {}
impl private::Sealed for Linked {}
impl private::Sealed for Configured {}
impl private::Sealed for DeadLettered {}

impl RegistrationState for Received {
    fn stage() -> RegistrationStage {
        RegistrationStage::Received
    }
}

impl RegistrationState for CredentialFetched {
    fn stage() -> RegistrationStage {
        RegistrationStage::CredentialFetched
    }
}

impl RegistrationState for SchemaDiscovered {
    fn stage() -> RegistrationStage {
        RegistrationStage::SchemaDiscovered
    }
}

impl RegistrationState for Linked {
    fn stage() -> RegistrationStage {
        RegistrationStage::Linked
    }
}

impl RegistrationState for Configured {
    fn stage() -> RegistrationStage {
        RegistrationStage::Configured
    }
}

impl RegistrationState for DeadLettered {
    fn stage() -> RegistrationStage {
        RegistrationStage::DeadLettered
    }
}

/// Registration of one account in state `S`.
#[derive(Debug)]
pub struct Registration<S: RegistrationState> {
    account: AccountId,
    state: S,
}

impl<S: RegistrationState> Registration<S> {
    /// The account being registered.
    #[must_use]
    pub const fn account(&self) -> &AccountId {
        &self.account
    }

    /// The current stage.
    #[must_use]
    pub fn stage(&self) -> RegistrationStage {
        S::stage()
    }

    fn transition<T: RegistrationState>(self, state: T) -> Registration<T> {
        Registration {
            account: self.account,
            state,
        }
    }
}

/// States from which a registration can still fail.
pub trait InProgress: RegistrationState {}

impl InProgress for Received {}
impl InProgress for CredentialFetched {}
impl InProgress for SchemaDiscovered {}
impl InProgress for Linked {}

impl<S: InProgress> Registration<S> {
    /// Give up on the registration.
    #[must_use]
    pub fn dead_letter(self, error: &RegistrarError) -> Registration<DeadLettered> {
        let from = S::stage();
        self.transition(DeadLettered {
            from,
            error: error.to_string(),
        })
    }
}

impl Registration<Received> {
    /// Start registering an account.
    #[must_use]
    pub const fn receive(account: AccountId) -> Self {
        Self {
            account,
            state: Received,
        }
    }

    /// The credential was fetched.
    #[must_use]
    pub fn credential_fetched(self, credential: VendorCredential) -> Registration<CredentialFetched> {
        self.transition(CredentialFetched { credential })
    }
}

impl Registration<CredentialFetched> {
    /// The credential to use for the vendor API.
    #[must_use]
    pub const fn credential(&self) -> &VendorCredential {
        &self.state.credential
    }

    /// The catalog was discovered.
    #[must_use]
    pub fn schema_discovered(self, catalog: IntegrationCatalog) -> Registration<SchemaDiscovered> {
        let CredentialFetched { credential } = self.state;
        Registration {
            account: self.account,
            state: SchemaDiscovered {
                credential,
                catalog,
            },
        }
    }
}

impl Registration<SchemaDiscovered> {
    /// The credential to use for the vendor API.
    #[must_use]
    pub const fn credential(&self) -> &VendorCredential {
        &self.state.credential
    }

    /// The discovered catalog.
    #[must_use]
    pub const fn catalog(&self) -> &IntegrationCatalog {
        &self.state.catalog
    }

    /// The account was linked.
    #[must_use]
    pub fn linked(self, linked_account_id: u64) -> Registration<Linked> {
        let SchemaDiscovered {
            credential,
            catalog,
        } = self.state;
        Registration {
            account: self.account,
            state: Linked {
                credential,
                catalog,
                linked_account_id,
            },
        }
    }

    /// The account was linked before; nothing left to do.
    #[must_use]
    pub fn already_linked(self) -> Registration<Configured> {
        self.transition(Configured {
            outcome: RegistrationOutcome::AlreadyLinked,
        })
    }
}

impl Registration<Linked> {
    /// The credential to use for the vendor API.
    #[must_use]
    pub const fn credential(&self) -> &VendorCredential {
        &self.state.credential
    }

    /// The discovered catalog.
    #[must_use]
    pub const fn catalog(&self) -> &IntegrationCatalog {
        &self.state.catalog
    }

    /// Vendor-assigned id of the link.
    #[must_use]
    pub const fn linked_account_id(&self) -> u64 {
        self.state.linked_account_id
    }

    /// Integrations were configured.
    #[must_use]
    pub fn configured(self, integrations: usize, errors: usize) -> Registration<Configured> {
        let linked_account_id = self.state.linked_account_id;
        self.transition(Configured {
            outcome: RegistrationOutcome::Configured {
                linked_account_id,
                integrations,
                errors,
            },
        })
    }
}

impl Registration<Configured> {
    /// The final outcome.
    #[must_use]
    pub const fn outcome(&self) -> &RegistrationOutcome {
        &self.state.outcome
    }

    /// Consume into the account and outcome.
    #[must_use]
    pub fn into_outcome(self) -> (AccountId, RegistrationOutcome) {
        (self.account, self.state.outcome)
    }
}

impl Registration<DeadLettered> {
    /// Stage the registration failed in.
    #[must_use]
    pub const fn failed_at(&self) -> RegistrationStage {
        self.state.from
    }

    /// The failure.
    #[must_use]
    pub fn error(&self) -> &str {
        &self.state.error
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn account() -> AccountId {
        AccountId::parse("111111111111").unwrap()
    }

    fn catalog() -> IntegrationCatalog {
        IntegrationCatalog::new(["cloudtrail", "ec2"]).unwrap()
    }

    #[test]
    fn happy_path_transitions() {
        let received = Registration::receive(account());
        assert_eq!(received.stage(), RegistrationStage::Received);

        let fetched = received.credential_fetched(VendorCredential::new("key"));
        assert_eq!(fetched.stage(), RegistrationStage::CredentialFetched);
        assert_eq!(fetched.credential().expose(), "key");

        let discovered = fetched.schema_discovered(catalog());
        assert_eq!(discovered.catalog().len(), 2);

        let linked = discovered.linked(42);
        assert_eq!(linked.linked_account_id(), 42);

        let configured = linked.configured(2, 0);
        assert_eq!(configured.stage(), RegistrationStage::Configured);

        let (account, outcome) = configured.into_outcome();
        assert_eq!(account.as_str(), "111111111111");
        assert_eq!(
            outcome,
            RegistrationOutcome::Configured {
                linked_account_id: 42,
                integrations: 2,
                errors: 0,
            }
        );
    }

    #[test]
    fn already_linked_is_terminal_success() {
        let configured = Registration::receive(account())
            .credential_fetched(VendorCredential::new("key"))
            .schema_discovered(catalog())
            .already_linked();

        assert_eq!(configured.outcome(), &RegistrationOutcome::AlreadyLinked);
    }

    #[test]
    fn dead_letter_records_stage() {
        let error = RegistrarError::schema("type missing");
        let dead = Registration::receive(account())
            .credential_fetched(VendorCredential::new("key"))
            .dead_letter(&error);

        assert_eq!(dead.stage(), RegistrationStage::DeadLettered);
        assert_eq!(dead.failed_at(), RegistrationStage::CredentialFetched);
        assert!(dead.error().contains("type missing"));
    }
}
