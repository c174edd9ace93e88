//! Dead-letter queue for messages that could not be registered.

mod sqs;

pub use sqs::SqsDeadLetterQueue;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{RegistrarError, RegistrarResult};

/// Sink for failing messages.
#[async_trait]
pub trait DeadLetterQueue: Send + Sync {
    /// Enqueue a message body verbatim.
    async fn send(&self, body: &str) -> RegistrarResult<()>;
}

/// In-memory dead-letter queue for testing.
#[derive(Debug, Default)]
pub struct MemoryDeadLetterQueue {
    messages: RwLock<Vec<String>>,
    fail: AtomicBool,
}

impl MemoryDeadLetterQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every send.
    #[must_use]
    pub fn failing(self) -> Self {
        self.fail.store(true, Ordering::SeqCst);
        self
    }

    /// Messages received so far.
    pub fn messages(&self) -> RegistrarResult<Vec<String>> {
        Ok(self
            .messages
            .read()
            .map_err(|_| RegistrarError::internal("lock poisoned"))?
            .clone())
    }
}

#[async_trait]
impl DeadLetterQueue for MemoryDeadLetterQueue {
    async fn send(&self, body: &str) -> RegistrarResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RegistrarError::dead_letter("queue unavailable"));
        }

        self.messages
            .write()
            .map_err(|_| RegistrarError::internal("lock poisoned"))?
            .push(body.to_owned());
        Ok(())
    }
}
