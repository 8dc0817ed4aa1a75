use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Consumer error: {0}")]
    Consumer(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The source will never yield another record.
    #[error("Record source closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, SourceError>;

/// Failure delivering one payload to the stats server.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Relay request failed: {0}")]
    Transport(String),

    #[error("Relay timed out: {0}")]
    Timeout(String),

    #[error("Stats server responded with status {0}")]
    Status(u16),

    #[error("Invalid relay configuration: {0}")]
    InvalidConfig(String),
}
