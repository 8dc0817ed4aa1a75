//! Relay payload sent from the subscriber to the stats server.

use crate::error::{PayloadError, Result};
use crate::event::Event;
use serde::{Deserialize, Serialize};

/// One decoded log record's contribution to the statistics.
///
/// Wire shape: `{"topic", "partition", "message": {"user","car","color"}, "key"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayPayload {
    pub topic: String,
    pub partition: i32,
    pub message: Event,
    pub key: String,
}

impl RelayPayload {
    /// Build a payload from a record's metadata and its decoded event.
    ///
    /// Keys are arbitrary bytes on the log; non-UTF-8 sequences are replaced
    /// rather than rejected.
    pub fn new(topic: &str, partition: i32, key: Option<&[u8]>, message: Event) -> Self {
        Self {
            topic: topic.to_string(),
            partition,
            message,
            key: key
                .map(|k| String::from_utf8_lossy(k).into_owned())
                .unwrap_or_default(),
        }
    }

    /// Decode and check a payload received over HTTP.
    pub fn from_json_slice(body: &[u8]) -> Result<Self> {
        let payload: RelayPayload = serde_json::from_slice(body)?;
        payload.validate()?;
        Ok(payload)
    }

    /// Reject payloads that are well-formed JSON but unusable as statistics.
    pub fn validate(&self) -> Result<()> {
        if self.partition < 0 {
            return Err(PayloadError::InvalidPartition(self.partition));
        }
        if self.topic.is_empty() {
            return Err(PayloadError::MissingField("topic".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_wire_shape() {
        let payload = RelayPayload::new(
            "cars",
            3,
            Some(b"Key-1".as_slice()),
            Event::new("John", "Kia", "Red"),
        );
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "topic": "cars",
                "partition": 3,
                "message": {"user": "John", "car": "Kia", "color": "Red"},
                "key": "Key-1"
            })
        );
    }

    #[test]
    fn test_payload_missing_message_is_rejected() {
        let body = br#"{"topic":"t","partition":1,"key":"Key-1"}"#;
        assert!(matches!(
            RelayPayload::from_json_slice(body),
            Err(PayloadError::Json(_))
        ));
    }

    #[test]
    fn test_payload_negative_partition_is_rejected() {
        let body = br#"{"topic":"t","partition":-1,"key":"k","message":{"user":"a","car":"b","color":"c"}}"#;
        assert!(matches!(
            RelayPayload::from_json_slice(body),
            Err(PayloadError::InvalidPartition(-1))
        ));
    }

    #[test]
    fn test_payload_without_key() {
        let payload = RelayPayload::new("t", 0, None, Event::new("a", "b", "c"));
        assert_eq!(payload.key, "");
    }
}
