//! Custom-resource lifecycle signals.
//!
//! A provisioning framework delivers a [`LifecycleRequest`] when a custom
//! resource is created, updated or deleted, and waits for a
//! [`LifecycleResponse`] to be uploaded to the request's `ResponseURL`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ProtocolError, ProtocolResult};
use crate::types::AccountId;

/// Lifecycle operation requested for a custom resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestType {
    /// Resource is being created.
    Create,
    /// Resource properties changed.
    Update,
    /// Resource is being removed.
    Delete,
    /// A request type this crate does not know.
    Other(String),
}

impl RequestType {
    /// Get the wire name of the request type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for RequestType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Create" => Self::Create,
            "Update" => Self::Update,
            "Delete" => Self::Delete,
            _ => Self::Other(value),
        }
    }
}

impl From<RequestType> for String {
    fn from(value: RequestType) -> Self {
        value.as_str().to_owned()
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A custom-resource lifecycle request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleRequest {
    /// Requested operation.
    pub request_type: RequestType,
    /// Presigned URL the response must be uploaded to.
    #[serde(rename = "ResponseURL", default, skip_serializing_if = "Option::is_none")]
    pub response_url: Option<String>,
    /// Stack that owns the resource.
    #[serde(default)]
    pub stack_id: String,
    /// Unique request identifier.
    #[serde(default)]
    pub request_id: String,
    /// Logical name of the resource in its template.
    #[serde(default)]
    pub logical_resource_id: String,
    /// Physical id assigned on creation; absent for `Create`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    /// Declared resource type, e.g. `Custom::Onboarding`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// Properties declared on the resource.
    #[serde(default)]
    pub resource_properties: Map<String, Value>,
    /// Previous properties, present on `Update`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_resource_properties: Option<Map<String, Value>>,
}

impl LifecycleRequest {
    /// Parse a request from JSON.
    pub fn from_json(body: &str) -> ProtocolResult<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Parse a request from an already-decoded JSON value.
    pub fn from_value(value: Value) -> ProtocolResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Get a string resource property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&str> {
        self.resource_properties.get(name).and_then(Value::as_str)
    }

    /// The account a spoke resource reports itself from (`SourceAccount`).
    ///
    /// Returns `Ok(None)` if the property is absent.
    pub fn source_account(&self) -> ProtocolResult<Option<AccountId>> {
        self.property("SourceAccount")
            .map(AccountId::parse)
            .transpose()
    }

    /// Physical resource id to report back.
    ///
    /// Reuses the id from the request when present so that updates and
    /// deletes never look like a replacement; otherwise generates one.
    #[must_use]
    pub fn physical_resource_id_or_generate(&self) -> String {
        self.physical_resource_id
            .clone()
            .unwrap_or_else(|| generated_physical_id(&self.logical_resource_id))
    }

    /// The `ResponseURL` of a raw event, even one that does not decode.
    #[must_use]
    pub fn response_url_of(event: &Value) -> Option<&str> {
        event.get("ResponseURL").and_then(Value::as_str)
    }

    /// The response URL, or an error if the request cannot be answered.
    pub fn require_response_url(&self) -> ProtocolResult<&str> {
        self.response_url
            .as_deref()
            .ok_or_else(|| ProtocolError::MissingResponseUrl {
                request_id: self.request_id.clone(),
            })
    }
}

fn generated_physical_id(logical_resource_id: &str) -> String {
    format!(
        "{}-{}",
        logical_resource_id,
        ulid::Ulid::new().to_string().to_lowercase()
    )
}

/// Outcome reported to the provisioning framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    /// The operation completed.
    Success,
    /// The operation failed; the framework rolls back.
    Failed,
}

/// Response uploaded to a lifecycle request's `ResponseURL`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleResponse {
    /// Success or failure.
    pub status: ResponseStatus,
    /// Human readable reason, shown by the framework on failure.
    pub reason: String,
    /// Physical id of the resource.
    pub physical_resource_id: String,
    /// Echoed from the request.
    pub stack_id: String,
    /// Echoed from the request.
    pub request_id: String,
    /// Echoed from the request.
    pub logical_resource_id: String,
    /// Whether `data` must be masked in the framework's output.
    #[serde(default)]
    pub no_echo: bool,
    /// Attributes exposed to the owning template.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl LifecycleResponse {
    /// Build a success response for a request.
    #[must_use]
    pub fn success(request: &LifecycleRequest, physical_resource_id: impl Into<String>) -> Self {
        Self::with_status(
            request,
            physical_resource_id.into(),
            ResponseStatus::Success,
            "See the function logs for details".to_owned(),
        )
    }

    /// Build a failure response for a request.
    #[must_use]
    pub fn failed(
        request: &LifecycleRequest,
        physical_resource_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::with_status(
            request,
            physical_resource_id.into(),
            ResponseStatus::Failed,
            reason.into(),
        )
    }

    /// Build a failure response for an event that could not be decoded.
    ///
    /// Echo fields are copied from whatever string values the event carries.
    #[must_use]
    pub fn failed_raw(event: &Value, reason: impl Into<String>) -> Self {
        let field = |name: &str| {
            event
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned()
        };

        let logical_resource_id = field("LogicalResourceId");
        let physical_resource_id = match field("PhysicalResourceId") {
            id if !id.is_empty() => id,
            _ => generated_physical_id(&logical_resource_id),
        };

        Self {
            status: ResponseStatus::Failed,
            reason: reason.into(),
            physical_resource_id,
            stack_id: field("StackId"),
            request_id: field("RequestId"),
            logical_resource_id,
            no_echo: false,
            data: Map::new(),
        }
    }

    /// Attach a data attribute.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    fn with_status(
        request: &LifecycleRequest,
        physical_resource_id: String,
        status: ResponseStatus,
        reason: String,
    ) -> Self {
        Self {
            status,
            reason,
            physical_resource_id,
            stack_id: request.stack_id.clone(),
            request_id: request.request_id.clone(),
            logical_resource_id: request.logical_resource_id.clone(),
            no_echo: false,
            data: Map::new(),
        }
    }
}
