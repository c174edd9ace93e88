//! Fleetlink account registrar.
//!
//! Consumes queue records announcing newly onboarded accounts and registers
//! each account with the observability vendor's GraphQL API.
//!
//! # Workflow
//!
//! For every account named by a message:
//!
//! 1. Read the vendor API key from the secret store.
//! 2. Discover the integration slugs from the vendor schema.
//! 3. Link the account, using the cross-account integration role.
//! 4. Configure one integration per slug for the linked account.
//!
//! A failure at any step sends the original message, verbatim, to the
//! dead-letter queue. An account that is already linked counts as done.
//!
//! Each registration walks a typestate ([`state::Registration`]) so a step
//! cannot be reached without the inputs the previous one produced.
//!
//! # Example
//!
//! ```ignore
//! use fleetlink_registrar::{RegistrarConfig, RegistrarService};
//!
//! let service = RegistrarService::from_config(RegistrarConfig::load()?).await?;
//! let report = service.invoke(event).await?;
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod credential;
pub mod dead_letter;
pub mod error;
pub mod graphql;
pub mod message;
pub mod registrar;
pub mod service;
pub mod state;
pub mod types;
pub mod vendor;

// Re-export commonly used types at the crate root
pub use config::{DeadLetterConfig, LifecycleConfig, RegistrarConfig, VendorConfig};
pub use credential::VendorCredential;
pub use dead_letter::{DeadLetterQueue, MemoryDeadLetterQueue, SqsDeadLetterQueue};
pub use error::{RegistrarError, RegistrarResult};
pub use message::RegistrationMessage;
pub use registrar::Registrar;
pub use service::RegistrarService;
pub use state::{Registration, RegistrationStage};
pub use types::{BatchReport, IntegrationCatalog, MessageOutcome, RegistrationOutcome};
pub use vendor::{GraphQlClient, LinkBehaviour, MemoryVendor, VendorApi, VendorCall};
