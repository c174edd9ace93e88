//! Queue batch envelopes.
//!
//! Handlers are invoked with a batch of records. A record delivered through
//! a topic subscription carries the message under `Sns.Message`; a record
//! delivered from a queue carries it under `body`.

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

/// A batch of queue records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueBatch {
    /// Records in delivery order.
    #[serde(rename = "Records", default)]
    pub records: Vec<QueueRecord>,
}

impl QueueBatch {
    /// Parse a batch from an already-decoded JSON value.
    pub fn from_value(value: serde_json::Value) -> ProtocolResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// One record of a [`QueueBatch`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueRecord {
    /// Topic notification payload.
    #[serde(rename = "Sns", default, skip_serializing_if = "Option::is_none")]
    pub sns: Option<SnsPayload>,
    /// Queue message body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Queue message id.
    #[serde(rename = "messageId", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// Topic notification carried by a record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnsPayload {
    /// The published message.
    pub message: String,
    /// Notification id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Topic the message was published to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_arn: Option<String>,
}

impl QueueRecord {
    /// Wrap a message as a topic notification record.
    #[must_use]
    pub fn sns(message: impl Into<String>) -> Self {
        Self {
            sns: Some(SnsPayload {
                message: message.into(),
                ..SnsPayload::default()
            }),
            ..Self::default()
        }
    }

    /// Wrap a message as a queue record.
    #[must_use]
    pub fn sqs(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::default()
        }
    }

    /// The message carried by this record.
    pub fn message(&self) -> ProtocolResult<&str> {
        self.sns
            .as_ref()
            .map(|sns| sns.message.as_str())
            .or(self.body.as_deref())
            .ok_or(ProtocolError::EmptyRecord)
    }

    /// Identifier of the delivered message, if the envelope carries one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.sns
            .as_ref()
            .and_then(|sns| sns.message_id.as_deref())
            .or(self.message_id.as_deref())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_sns_record() {
        let batch: QueueBatch = serde_json::from_str(
            r#"{"Records": [{"EventSource": "aws:sns", "Sns": {"MessageId": "m-1", "TopicArn": "arn:aws:sns:us-east-1:123456789012:onboard", "Message": "{\"a\":1}"}}]}"#,
        )
        .unwrap();

        assert_eq!(batch.records.len(), 1);
        let record = &batch.records[0];
        assert_eq!(record.message().unwrap(), r#"{"a":1}"#);
        assert_eq!(record.id(), Some("m-1"));
    }

    #[test]
    fn unwraps_sqs_record() {
        let batch: QueueBatch = serde_json::from_str(
            r#"{"Records": [{"messageId": "q-1", "body": "hello", "eventSource": "aws:sqs"}]}"#,
        )
        .unwrap();

        let record = &batch.records[0];
        assert_eq!(record.message().unwrap(), "hello");
        assert_eq!(record.id(), Some("q-1"));
    }

    #[test]
    fn empty_record_is_an_error() {
        let record = QueueRecord::default();
        assert!(matches!(record.message(), Err(ProtocolError::EmptyRecord)));
    }

    #[test]
    fn missing_records_is_an_empty_batch() {
        let batch = QueueBatch::from_value(serde_json::json!({})).unwrap();
        assert!(batch.records.is_empty());
    }
}
