//! Error types for stats-types crate.

use thiserror::Error;

/// Errors raised while decoding or checking a relay payload.
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid partition: {0}")]
    InvalidPartition(i32),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Result type alias for payload operations.
pub type Result<T> = std::result::Result<T, PayloadError>;
