use crate::error::AggregatorError;
use stats_types::{AggregateState, RelayPayload};
use tokio::sync::Mutex;

/// Running counters over every accepted payload.
///
/// All three updates of an ingest happen under one lock, and snapshots take
/// the same lock, so readers never see a half-applied ingest.
#[derive(Debug, Default)]
pub struct Aggregator {
    state: Mutex<AggregateState>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one payload that has already been parsed.
    pub async fn ingest(&self, payload: RelayPayload) -> Result<(), AggregatorError> {
        payload
            .validate()
            .map_err(|e| AggregatorError::InvalidPayload(e.to_string()))?;
        self.state.lock().await.apply(payload);
        Ok(())
    }

    /// Parse and apply a JSON payload. The state is untouched on error.
    pub async fn ingest_json(&self, body: &[u8]) -> Result<(), AggregatorError> {
        let payload = RelayPayload::from_json_slice(body)
            .map_err(|e| AggregatorError::InvalidPayload(e.to_string()))?;
        self.state.lock().await.apply(payload);
        Ok(())
    }

    pub async fn snapshot(&self) -> AggregateState {
        self.state.lock().await.clone()
    }
}
