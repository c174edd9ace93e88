//! Error types for secrets access.

use thiserror::Error;

/// Errors that can occur during secrets operations.
#[derive(Debug, Error)]
pub enum SecretsError {
    /// Secret not found.
    #[error("secret not found: {id}")]
    NotFound {
        /// Identifier of the secret that was not found.
        id: String,
    },

    /// Backend not configured.
    #[error("secrets backend not configured")]
    NotConfigured,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The secret value does not have the expected shape.
    #[error("malformed secret {id}: {reason}")]
    Malformed {
        /// Identifier or field of the malformed secret.
        id: String,
        /// What was wrong, never including the value itself.
        reason: String,
    },

    /// Backend error.
    #[error("backend error: {0}")]
    Backend(String),
}
