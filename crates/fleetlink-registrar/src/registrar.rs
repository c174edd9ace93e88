//! Account registration workflow.
//!
//! For every account named by a queue message: fetch the vendor credential,
//! discover the integration catalog, link the account, then configure one
//! integration per slug. A failure at any step sends the original message to
//! the dead-letter queue.

use std::fmt::Display;
use std::sync::Arc;

use fleetlink_proto::{
    AccountId, LifecycleRequest, LifecycleResponder, LifecycleResponse, QueueBatch, QueueRecord,
    RequestType,
};
use fleetlink_secrets::SecretsBackend;
use tracing::{error, info, warn};

use crate::config::VendorConfig;
use crate::credential::VendorCredential;
use crate::dead_letter::DeadLetterQueue;
use crate::error::{RegistrarError, RegistrarResult};
use crate::graphql::AwsLinkInput;
use crate::message::RegistrationMessage;
use crate::state::{Configured, DeadLettered, Registration};
use crate::types::{BatchReport, IntegrationCatalog, MessageOutcome, RegistrationOutcome};
use crate::vendor::VendorApi;

/// Result of the link mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkResult {
    Linked(u64),
    AlreadyLinked,
}

/// Registers accounts with the vendor.
pub struct Registrar {
    secrets: Arc<dyn SecretsBackend>,
    vendor: Arc<dyn VendorApi>,
    dead_letter: Arc<dyn DeadLetterQueue>,
    responder: Arc<dyn LifecycleResponder>,
    config: VendorConfig,
}

impl Registrar {
    /// Create a new registrar.
    pub fn new(
        secrets: Arc<dyn SecretsBackend>,
        vendor: Arc<dyn VendorApi>,
        dead_letter: Arc<dyn DeadLetterQueue>,
        responder: Arc<dyn LifecycleResponder>,
        config: VendorConfig,
    ) -> Self {
        Self {
            secrets,
            vendor,
            dead_letter,
            responder,
            config,
        }
    }

    /// Read the vendor credential from the secret store.
    pub async fn fetch_credential(&self) -> RegistrarResult<VendorCredential> {
        VendorCredential::fetch(
            self.secrets.as_ref(),
            &self.config.secret_id,
            &self.config.credential_field,
        )
        .await
    }

    /// Discover the integration slugs the vendor accepts.
    ///
    /// Every failure, including a missing or empty input type, is logged and
    /// returned as [`RegistrarError::Schema`].
    pub async fn discover_schema(
        &self,
        credential: &VendorCredential,
    ) -> RegistrarResult<IntegrationCatalog> {
        let input_type = &self.config.integration_input_type;

        let schema = self.vendor.introspect(credential).await.map_err(|e| {
            error!(error = %e, "schema introspection failed");
            RegistrarError::schema(e.to_string())
        })?;

        let Some(fields) = schema.input_fields_of(input_type) else {
            error!(input_type = %input_type, "integration input type missing from schema");
            return Err(RegistrarError::schema(format!(
                "input type {input_type} not found"
            )));
        };

        let catalog = IntegrationCatalog::new(fields).inspect_err(|_| {
            error!(input_type = %input_type, "integration input type has no fields");
        })?;

        info!(
            integrations = ?catalog.slugs().collect::<Vec<_>>(),
            "available integrations discovered"
        );
        Ok(catalog)
    }

    /// Link an account, then configure every integration in the catalog.
    ///
    /// The configure mutation only runs when linking yields a linked account
    /// id. An account that is already linked is not an error.
    pub async fn register(
        &self,
        account: &AccountId,
        credential: &VendorCredential,
        vendor_account: u64,
        catalog: &IntegrationCatalog,
    ) -> RegistrarResult<RegistrationOutcome> {
        match self.link(account, credential, vendor_account).await? {
            LinkResult::AlreadyLinked => Ok(RegistrationOutcome::AlreadyLinked),
            LinkResult::Linked(linked_account_id) => {
                let (integrations, errors) = self
                    .configure(account, credential, vendor_account, catalog, linked_account_id)
                    .await?;
                Ok(RegistrationOutcome::Configured {
                    linked_account_id,
                    integrations,
                    errors,
                })
            }
        }
    }

    /// Forward a failing message to the dead-letter queue.
    ///
    /// Returns whether the message was delivered. A delivery failure is only
    /// logged.
    pub async fn on_failure(&self, original_message: &str) -> bool {
        match self.dead_letter.send(original_message).await {
            Ok(()) => {
                info!("message sent to dead-letter queue");
                true
            }
            Err(e) => {
                error!(error = %e, "failed to send message to dead-letter queue");
                false
            }
        }
    }

    /// Handle one registration message body.
    pub async fn handle_message(&self, body: &str) -> MessageOutcome {
        let message = match RegistrationMessage::parse(body) {
            Ok(message) => message,
            Err(e) => {
                error!(error = %e, "unrecognised registration message");
                return self.fail_message(body, e).await;
            }
        };

        info!(kind = message.kind(), "registration message received");

        match message {
            RegistrationMessage::FanOut(fan_out) => {
                let accounts = RegistrationMessage::fan_out_accounts(&fan_out);
                self.register_accounts(body, accounts).await
            }
            RegistrationMessage::Lifecycle(request) => {
                self.handle_spoke_request(body, &request).await
            }
        }
    }

    /// Handle one queue record.
    ///
    /// A record without a message body is dead-lettered as its raw JSON.
    pub async fn handle_record(&self, record: &QueueRecord) -> MessageOutcome {
        match record.message() {
            Ok(body) => self.handle_message(body).await,
            Err(e) => {
                warn!(record = record.id().unwrap_or("unknown"), error = %e, "empty queue record");
                let raw = serde_json::to_string(record).unwrap_or_default();
                self.fail_message(&raw, e).await
            }
        }
    }

    /// Handle every record of a batch, in order.
    pub async fn handle_batch(&self, batch: &QueueBatch) -> BatchReport {
        let mut report = BatchReport::default();

        for record in &batch.records {
            let outcome = self.handle_record(record).await;
            report.record(&outcome);
        }

        info!(
            messages = report.messages,
            registered = report.registered,
            already_linked = report.already_linked,
            skipped = report.skipped,
            dead_lettered = report.dead_lettered,
            "batch processed"
        );
        report
    }

    async fn handle_spoke_request(&self, body: &str, request: &LifecycleRequest) -> MessageOutcome {
        let outcome = match &request.request_type {
            RequestType::Create => match request.source_account() {
                Ok(Some(account)) => self.register_accounts(body, vec![account]).await,
                Ok(None) => {
                    error!(request_id = %request.request_id, "lifecycle request has no SourceAccount");
                    self.fail_message(body, "lifecycle request has no SourceAccount")
                        .await
                }
                Err(e) => self.fail_message(body, e).await,
            },
            other => {
                info!(request_type = %other, "not an instance creation, skipping");
                MessageOutcome::Skipped {
                    reason: format!("{other} request"),
                }
            }
        };

        self.acknowledge(request).await;
        outcome
    }

    async fn acknowledge(&self, request: &LifecycleRequest) {
        let Some(url) = request.response_url.as_deref() else {
            return;
        };

        let response =
            LifecycleResponse::success(request, request.physical_resource_id_or_generate());
        if let Err(e) = self.responder.respond(url, &response).await {
            warn!(request_id = %request.request_id, error = %e, "failed to answer lifecycle request");
        }
    }

    async fn register_accounts(&self, body: &str, accounts: Vec<AccountId>) -> MessageOutcome {
        let mut outcomes = Vec::with_capacity(accounts.len());

        for account in accounts {
            match self.register_account(account).await {
                Ok(done) => outcomes.push(done.into_outcome()),
                Err(dead) => {
                    error!(
                        account = %dead.account(),
                        stage = %dead.failed_at(),
                        error = dead.error(),
                        "registration failed"
                    );
                    let error = dead.error().to_owned();
                    return self.fail_message(body, error).await;
                }
            }
        }

        MessageOutcome::Registered { accounts: outcomes }
    }

    async fn register_account(
        &self,
        account: AccountId,
    ) -> Result<Registration<Configured>, Registration<DeadLettered>> {
        let received = Registration::receive(account);
        info!(account = %received.account(), "registering account");

        let credential = self.fetch_credential().await;
        let fetched = match credential {
            Ok(credential) => received.credential_fetched(credential),
            Err(e) => {
                error!(error = %e, "unable to read vendor credential");
                return Err(received.dead_letter(&e));
            }
        };

        let catalog = self.discover_schema(fetched.credential()).await;
        let discovered = match catalog {
            Ok(catalog) => fetched.schema_discovered(catalog),
            Err(e) => return Err(fetched.dead_letter(&e)),
        };

        let vendor_account = self.config.account_id;
        let link = self
            .link(discovered.account(), discovered.credential(), vendor_account)
            .await;
        let linked = match link {
            Ok(LinkResult::Linked(id)) => discovered.linked(id),
            Ok(LinkResult::AlreadyLinked) => return Ok(discovered.already_linked()),
            Err(e) => return Err(discovered.dead_letter(&e)),
        };

        let configured = self
            .configure(
                linked.account(),
                linked.credential(),
                vendor_account,
                linked.catalog(),
                linked.linked_account_id(),
            )
            .await;
        match configured {
            Ok((integrations, errors)) => Ok(linked.configured(integrations, errors)),
            Err(e) => Err(linked.dead_letter(&e)),
        }
    }

    async fn link(
        &self,
        account: &AccountId,
        credential: &VendorCredential,
        vendor_account: u64,
    ) -> RegistrarResult<LinkResult> {
        let input = AwsLinkInput {
            name: account.to_string(),
            arn: self.config.role_arn(account, vendor_account),
        };

        let payload = self
            .vendor
            .link_account(credential, vendor_account, &input)
            .await?;

        let (already_linked, other): (Vec<_>, Vec<_>) =
            payload.errors.iter().partition(|e| e.is_already_linked());

        for e in &other {
            warn!(account = %account, error = %e.message, "vendor reported a link error");
        }

        if !already_linked.is_empty() {
            info!(account = %account, "account already linked, skipping");
            return Ok(LinkResult::AlreadyLinked);
        }

        if let Some(linked) = payload.linked_accounts.first() {
            info!(account = %account, linked_account_id = linked.id, "account linked");
            return Ok(LinkResult::Linked(linked.id));
        }

        let reasons: Vec<&str> = other.iter().map(|e| e.message.as_str()).collect();
        Err(RegistrarError::vendor(format!(
            "linking {account} returned no linked account: {}",
            if reasons.is_empty() {
                "no errors reported".to_owned()
            } else {
                reasons.join("; ")
            }
        )))
    }

    async fn configure(
        &self,
        account: &AccountId,
        credential: &VendorCredential,
        vendor_account: u64,
        catalog: &IntegrationCatalog,
        linked_account_id: u64,
    ) -> RegistrarResult<(usize, usize)> {
        let input = catalog.integrations_for(linked_account_id);
        let payload = self
            .vendor
            .configure_integrations(credential, vendor_account, &input)
            .await?;

        for e in &payload.errors {
            warn!(account = %account, error = %e.message, "integration not configured");
        }

        info!(
            account = %account,
            linked_account_id,
            integrations = payload.integrations.len(),
            errors = payload.errors.len(),
            "integrations configured"
        );
        Ok((payload.integrations.len(), payload.errors.len()))
    }

    async fn fail_message(&self, body: &str, error: impl Display) -> MessageOutcome {
        let delivered = self.on_failure(body).await;
        MessageOutcome::DeadLettered {
            error: error.to_string(),
            delivered,
        }
    }
}
