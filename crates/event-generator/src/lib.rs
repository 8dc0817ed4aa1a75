//! Synthetic event generation.
//!
//! Produces an endless stream of purchase events by sampling uniformly from
//! fixed value sets, plus a routing key drawn from its own set.

pub mod generator;
pub mod values;

pub use generator::{EventGenerator, GeneratorError};
pub use values::ValueSets;
