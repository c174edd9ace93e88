//! Message topic used to fan out instance creation.

mod sns;

pub use sns::SnsPublisher;

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{ControlError, ControlResult};

/// Publishes messages to a topic.
#[async_trait]
pub trait TopicPublisher: Send + Sync {
    /// Publish one message and return the id the topic assigned to it.
    async fn publish(&self, topic: &str, message: &str) -> ControlResult<String>;
}

/// In-memory topic for testing.
#[derive(Debug, Default)]
pub struct MemoryTopic {
    published: RwLock<Vec<(String, String)>>,
    next_id: AtomicU32,
    fail: AtomicBool,
}

impl MemoryTopic {
    /// Create an empty topic.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every publish.
    #[must_use]
    pub fn failing(self) -> Self {
        self.fail.store(true, Ordering::SeqCst);
        self
    }

    /// Messages published so far as `(topic, message)` pairs.
    pub fn published(&self) -> ControlResult<Vec<(String, String)>> {
        Ok(self
            .published
            .read()
            .map_err(|_| ControlError::internal("lock poisoned"))?
            .clone())
    }
}

#[async_trait]
impl TopicPublisher for MemoryTopic {
    async fn publish(&self, topic: &str, message: &str) -> ControlResult<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ControlError::publish(format!("topic unavailable: {topic}")));
        }

        self.published
            .write()
            .map_err(|_| ControlError::internal("lock poisoned"))?
            .push((topic.to_owned(), message.to_owned()));

        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(format!("msg-{n}"))
    }
}
