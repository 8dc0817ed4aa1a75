//! The synthetic domain event: a person bought a car of some color.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single purchase event.
///
/// On the wire the vehicle is named `car`, matching the registered schema
/// and the relay payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Event {
    pub user: String,
    #[serde(rename = "car")]
    pub vehicle: String,
    pub color: String,
}

impl Event {
    pub fn new(
        user: impl Into<String>,
        vehicle: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            vehicle: vehicle.into(),
            color: color.into(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bought a {} {}", self.user, self.color, self.vehicle)
    }
}
