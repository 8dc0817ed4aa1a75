//! Error types for the schema codec.

use thiserror::Error;

/// Failures talking to a schema registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Schema registry unreachable: {0}")]
    Unreachable(String),

    #[error("Not found in schema registry: {0}")]
    NotFound(String),

    #[error("Schema registry rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid schema registry response: {0}")]
    InvalidResponse(String),

    #[error("Invalid schema registry configuration: {0}")]
    InvalidConfig(String),
}

/// Per-message codec failures.
///
/// Everything except `Encode` corresponds to a distinct class of bad input or
/// unavailable collaborator, so callers can log and drop a single message
/// without tearing down their loop.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Schema unavailable for '{subject}': {source}")]
    SchemaUnavailable {
        subject: String,
        #[source]
        source: RegistryError,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] crate::json_schema::ValidationError),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Invalid schema {id}: {message}")]
    InvalidSchema { id: u32, message: String },
}

pub type Result<T> = std::result::Result<T, CodecError>;
