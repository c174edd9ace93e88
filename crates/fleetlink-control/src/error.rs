//! Error types for fleetlink-control.

use fleetlink_proto::ProtocolError;

/// Result type alias using [`ControlError`].
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in the fleet deployment manager.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// Fleet provisioning API error.
    #[error("provisioning error: {0}")]
    Provisioning(String),

    /// Template was not found after it was created.
    #[error("deployment template {0} not found after creation")]
    TemplateNotFound(String),

    /// Topic publish error.
    #[error("publish error: {0}")]
    Publish(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invocation context could not be interpreted.
    #[error("invalid invocation context: {0}")]
    InvalidContext(String),

    /// Wire protocol error.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Serialisation error.
    #[error("serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ControlError {
    /// Create a provisioning error.
    #[must_use]
    pub fn provisioning(msg: impl Into<String>) -> Self {
        Self::Provisioning(msg.into())
    }

    /// Create a publish error.
    #[must_use]
    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
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
