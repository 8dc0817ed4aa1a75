use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregatorError {
    /// The payload could not be parsed or lacks a required field.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}
