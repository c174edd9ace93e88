//! Delivery of lifecycle responses.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, info};

use crate::error::{ProtocolError, ProtocolResult};
use crate::lifecycle::LifecycleResponse;

/// Sends a [`LifecycleResponse`] back to the provisioning framework.
#[async_trait]
pub trait LifecycleResponder: Send + Sync {
    /// Upload the response to the request's response URL.
    async fn respond(&self, response_url: &str, response: &LifecycleResponse)
        -> ProtocolResult<()>;
}

/// Uploads responses with an HTTP `PUT` to the presigned response URL.
#[derive(Debug, Clone)]
pub struct HttpResponder {
    client: Client,
}

impl HttpResponder {
    /// Create a responder with the given request timeout.
    pub fn new(timeout: Duration) -> ProtocolResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LifecycleResponder for HttpResponder {
    async fn respond(
        &self,
        response_url: &str,
        response: &LifecycleResponse,
    ) -> ProtocolResult<()> {
        let body = serde_json::to_vec(response)?;
        debug!(request_id = %response.request_id, bytes = body.len(), "uploading lifecycle response");

        // The presigned URL is signed without a content type.
        let result = self
            .client
            .put(response_url)
            .header(CONTENT_TYPE, HeaderValue::from_static(""))
            .body(body)
            .send()
            .await?;

        let status = result.status();
        if !status.is_success() {
            return Err(ProtocolError::ResponseRejected {
                status: status.as_u16(),
            });
        }

        info!(
            request_id = %response.request_id,
            status = ?response.status,
            "lifecycle response delivered"
        );
        Ok(())
    }
}

/// Responder that records responses in memory, for testing.
#[derive(Debug, Default)]
pub struct MemoryResponder {
    responses: Mutex<Vec<(String, LifecycleResponse)>>,
}

impl MemoryResponder {
    /// Create an empty responder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Responses recorded so far, with the URL each was sent to.
    #[must_use]
    pub fn responses(&self) -> Vec<(String, LifecycleResponse)> {
        self.responses
            .lock()
            .map(|responses| responses.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LifecycleResponder for MemoryResponder {
    async fn respond(
        &self,
        response_url: &str,
        response: &LifecycleResponse,
    ) -> ProtocolResult<()> {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push((response_url.to_owned(), response.clone()));
        }
        Ok(())
    }
}
