//! Registration messages carried by queue records.

use fleetlink_proto::{AccountId, FanOutMessage, LifecycleRequest};
use serde_json::Value;

use crate::error::{RegistrarError, RegistrarResult};

/// A decoded registration message.
#[derive(Debug, Clone)]
pub enum RegistrationMessage {
    /// First-launch fan-out naming seed accounts.
    FanOut(FanOutMessage),
    /// Lifecycle request forwarded from a member account's stack.
    Lifecycle(LifecycleRequest),
}

impl RegistrationMessage {
    /// Decode a message body.
    ///
    /// Objects carrying `RequestType` are lifecycle requests; anything else
    /// must be a non-empty fan-out message.
    pub fn parse(body: &str) -> RegistrarResult<Self> {
        let value: Value = serde_json::from_str(body)?;

        if value.get("RequestType").is_some() {
            return Ok(Self::Lifecycle(LifecycleRequest::from_value(value)?));
        }

        let message = FanOutMessage::from_json(body)?;
        if message.accounts().is_empty() {
            return Err(RegistrarError::message("fan-out message names no account"));
        }

        Ok(Self::FanOut(message))
    }

    /// Short description for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::FanOut(_) => "fan_out",
            Self::Lifecycle(_) => "lifecycle",
        }
    }

    /// Accounts a fan-out message asks to register, in order.
    #[must_use]
    pub fn fan_out_accounts(message: &FanOutMessage) -> Vec<AccountId> {
        message.accounts().into_iter().cloned().collect()
    }
}
