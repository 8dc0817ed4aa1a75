//! Running statistics reported by the stats server.

use crate::event::Event;
use crate::payload::RelayPayload;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counters over every accepted relay payload.
///
/// `total` always equals the sum of `per_partition` values; both are updated
/// together by [`AggregateState::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateState {
    pub total: u64,
    #[serde(rename = "total_partition")]
    pub per_partition: BTreeMap<i32, u64>,
    #[serde(rename = "last_message")]
    pub last_message: Option<Event>,
}

impl AggregateState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one payload into the counters.
    pub fn apply(&mut self, payload: RelayPayload) {
        self.total += 1;
        *self.per_partition.entry(payload.partition).or_insert(0) += 1;
        self.last_message = Some(payload.message);
    }

    /// Sum of the per-partition counters.
    pub fn partition_sum(&self) -> u64 {
        self.per_partition.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(partition: i32, user: &str) -> RelayPayload {
        RelayPayload::new(
            "t",
            partition,
            Some(b"Key-1".as_slice()),
            Event::new(user, "Kia", "Red"),
        )
    }

    #[test]
    fn test_apply_counts_first_record_once() {
        let mut state = AggregateState::new();
        state.apply(payload(3, "John"));

        assert_eq!(state.total, 1);
        assert_eq!(state.per_partition.get(&3), Some(&1));
        assert_eq!(state.last_message, Some(Event::new("John", "Kia", "Red")));
    }

    #[test]
    fn test_total_matches_partition_sum() {
        let mut state = AggregateState::new();
        for (i, partition) in [0, 1, 1, 2, 0, 0].into_iter().enumerate() {
            state.apply(payload(partition, &format!("user-{i}")));
            assert_eq!(state.total, state.partition_sum());
        }
        assert_eq!(state.per_partition.get(&0), Some(&3));
        assert_eq!(
            state.last_message.as_ref().map(|e| e.user.as_str()),
            Some("user-5")
        );
    }

    #[test]
    fn test_snapshot_json_shape() {
        let mut state = AggregateState::new();
        state.apply(payload(3, "John"));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "total": 1,
                "total_partition": {"3": 1},
                "last_message": {"user": "John", "car": "Kia", "color": "Red"}
            })
        );
    }

    #[test]
    fn test_empty_state_has_null_last_message() {
        let json = serde_json::to_value(AggregateState::new()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"total": 0, "total_partition": {}, "last_message": null})
        );
    }
}
