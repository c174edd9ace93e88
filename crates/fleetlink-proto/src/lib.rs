//! Wire types shared by the fleetlink workflows.
//!
//! The fleet deployment manager and the account registrar never share
//! process state. They communicate only through the JSON documents defined
//! here:
//!
//! - [`LifecycleRequest`] / [`LifecycleResponse`]: custom-resource lifecycle
//!   signals and the answer posted back to the provisioning framework
//! - [`FanOutMessage`]: the instruction naming target accounts and regions
//!   for a deployment template
//! - [`QueueBatch`]: the batch of queue records a handler is invoked with,
//!   each record wrapping one message in an SNS or SQS envelope
//!
//! # Example
//!
//! ```
//! use fleetlink_proto::{AccountId, FanOutMessage, Region};
//!
//! let account = AccountId::parse("111111111111").unwrap();
//! let message = FanOutMessage::single("NR-Stack", [account], Region::new("us-east-1"));
//!
//! assert_eq!(
//!     message.to_json().unwrap(),
//!     r#"{"NR-Stack":{"target_accounts":["111111111111"],"target_regions":["us-east-1"]}}"#
//! );
//! ```

#![forbid(unsafe_code)]

mod envelope;
mod error;
mod fanout;
mod lifecycle;
mod responder;
mod types;

pub use envelope::{QueueBatch, QueueRecord, SnsPayload};
pub use error::{ProtocolError, ProtocolResult};
pub use fanout::{FanOutMessage, FanOutTarget};
pub use lifecycle::{LifecycleRequest, LifecycleResponse, RequestType, ResponseStatus};
pub use responder::{HttpResponder, LifecycleResponder, MemoryResponder};
pub use types::{AccountId, Region};
