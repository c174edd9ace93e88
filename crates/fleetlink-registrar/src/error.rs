//! Error types for fleetlink-registrar.

use fleetlink_proto::ProtocolError;
use fleetlink_secrets::SecretsError;

/// Result type alias using [`RegistrarError`].
pub type RegistrarResult<T> = Result<T, RegistrarError>;

/// Errors that can occur while registering accounts.
#[derive(Debug, thiserror::Error)]
pub enum RegistrarError {
    /// The vendor credential could not be read.
    #[error("credential unavailable: {0}")]
    Credential(#[from] SecretsError),

    /// The secret exists but lacks the credential field.
    #[error("secret has no {0} field")]
    MissingCredentialField(String),

    /// Integration catalog could not be discovered.
    #[error("schema discovery failed: {0}")]
    Schema(String),

    /// The vendor API answered with top-level GraphQL errors.
    #[error("{operation} failed: {}", messages.join("; "))]
    GraphQl {
        /// Operation that failed.
        operation: &'static str,
        /// Error messages reported by the API.
        messages: Vec<String>,
    },

    /// The vendor API answered with something unusable.
    #[error("vendor error: {0}")]
    Vendor(String),

    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Wire protocol error.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The queue message is not a registration message.
    #[error("unrecognised message: {0}")]
    Message(String),

    /// Dead-letter queue error.
    #[error("dead-letter error: {0}")]
    DeadLetter(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RegistrarError {
    /// Create a schema error.
    #[must_use]
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a vendor error.
    #[must_use]
    pub fn vendor(msg: impl Into<String>) -> Self {
        Self::Vendor(msg.into())
    }

    /// Create a message error.
    #[must_use]
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    /// Create a dead-letter error.
    #[must_use]
    pub fn dead_letter(msg: impl Into<String>) -> Self {
        Self::DeadLetter(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
