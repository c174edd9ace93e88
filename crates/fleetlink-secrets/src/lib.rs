//! Read-only secrets access for fleetlink.
//!
//! This crate provides a trait-based abstraction over the secret store that
//! holds the vendor API credential. Values are protected in memory using the
//! `secrecy` and `zeroize` crates and never appear in `Debug` output.
//!
//! # Backends
//!
//! - **Memory**: in-memory storage for testing
//! - **Env**: environment variables, for local development
//! - **Aws** (`aws` feature): AWS Secrets Manager
//!
//! Writing secrets is out of scope; every backend is read-only from the
//! point of view of [`SecretsBackend`].
//!
//! # Example
//!
//! ```rust,ignore
//! use fleetlink_secrets::{SecretsBackend, SecretsConfig, SecretsProvider};
//!
//! let provider = SecretsProvider::from_config(&SecretsConfig::default()).await?;
//! let backend = provider.backend()?;
//!
//! if let Some(secret) = backend.get("arn:aws:secretsmanager:...:secret:vendor").await? {
//!     let access_key = secret.json_field("AccessKey")?;
//! }
//! ```

mod config;
mod env;
mod error;
mod memory;
mod provider;
mod traits;
mod types;

#[cfg(feature = "aws")]
mod aws;

pub use config::{SecretsBackendConfig, SecretsConfig};
pub use env::EnvSecrets;
pub use error::SecretsError;
pub use memory::MemorySecrets;
pub use provider::SecretsProvider;
pub use traits::SecretsBackend;
pub use types::SecretValue;

#[cfg(feature = "aws")]
pub use aws::AwsSecrets;
