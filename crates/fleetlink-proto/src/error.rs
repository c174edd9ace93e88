//! Error types for the wire protocol.

use thiserror::Error;

/// Result type alias using [`ProtocolError`].
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while decoding messages or answering lifecycle signals.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Account identifier is not a 12-digit number.
    #[error("invalid account id: {0:?}")]
    InvalidAccountId(String),

    /// Message body is not valid JSON of the expected shape.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Queue record carried neither an SNS message nor an SQS body.
    #[error("queue record has no message body")]
    EmptyRecord,

    /// Lifecycle request has no response URL to answer.
    #[error("lifecycle request {request_id} has no response URL")]
    MissingResponseUrl {
        /// Request identifier from the lifecycle signal.
        request_id: String,
    },

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response URL rejected the lifecycle response.
    #[error("lifecycle response rejected with status {status}")]
    ResponseRejected {
        /// HTTP status returned by the response URL.
        status: u16,
    },
}
