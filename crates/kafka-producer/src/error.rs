//! Error types for the publisher.

use schema_codec::CodecError;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`Publisher::publish`](crate::Publisher::publish).
///
/// Everything except `Serialization` is a broker-side failure the caller may
/// retry; a retried publish after a timeout can append a duplicate.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] CodecError),

    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Publish timed out after {0:?}")]
    Timeout(Duration),

    #[error("Topic metadata error: {0}")]
    Metadata(String),

    #[error("Topic creation error: {0}")]
    TopicCreation(String),

    #[error("Flush error: {0}")]
    Flush(String),
}

impl PublishError {
    /// Whether retrying the same publish can succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PublishError::Serialization(_))
    }
}

pub type Result<T> = std::result::Result<T, PublishError>;
