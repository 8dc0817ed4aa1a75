//! Shared types for the vehicle-stats pipeline.
//!
//! These are the shapes that cross process boundaries: the [`Event`] that
//! travels through the log, the [`RelayPayload`] the subscriber sends to the
//! stats server, and the [`AggregateState`] the stats server reports.
//!
//! # Dependency Direction
//!
//! Every other crate in the workspace depends on this one; this crate depends
//! on nothing but serde.

pub mod error;
pub mod event;
pub mod payload;
pub mod state;

pub use error::{PayloadError, Result};
pub use event::Event;
pub use payload::RelayPayload;
pub use state::AggregateState;
