//! The event generator.

use crate::values::ValueSets;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use stats_types::Event;

/// Error type for generator construction.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// A value set has nothing to sample from
    #[error("Value set '{0}' is empty")]
    EmptyValueSet(&'static str),
}

/// Generates synthetic purchase events.
///
/// Each draw is independent; the only state is the random source. With a
/// seed the stream is reproducible, which tests rely on.
pub struct EventGenerator {
    values: ValueSets,
    rng: StdRng,
}

impl EventGenerator {
    /// Create a generator over `values`, seeded from the OS when `seed` is
    /// `None`.
    pub fn new(values: ValueSets, seed: Option<u64>) -> Result<Self, GeneratorError> {
        if let Some(name) = values.first_empty() {
            return Err(GeneratorError::EmptyValueSet(name));
        }
        Ok(Self {
            values,
            rng: rng_from(seed),
        })
    }

    /// Generator over the default value sets.
    pub fn with_defaults(seed: Option<u64>) -> Self {
        Self {
            values: ValueSets::default(),
            rng: rng_from(seed),
        }
    }

    pub fn values(&self) -> &ValueSets {
        &self.values
    }

    /// Draw the next event.
    pub fn next_event(&mut self) -> Event {
        Event::new(
            pick(&self.values.users, &mut self.rng),
            pick(&self.values.vehicles, &mut self.rng),
            pick(&self.values.colors, &mut self.rng),
        )
    }

    /// Draw a partition routing key.
    pub fn next_key(&mut self) -> String {
        pick(&self.values.keys, &mut self.rng)
    }
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn pick(values: &[String], rng: &mut StdRng) -> String {
    // Sets are checked non-empty at construction
    values.choose(rng).cloned().unwrap_or_default()
}

/// Infinite stream of `(key, event)` pairs.
impl Iterator for EventGenerator {
    type Item = (String, Event);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.next_key();
        Some((key, self.next_event()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_same_seed_same_stream() {
        let a: Vec<_> = EventGenerator::with_defaults(Some(42)).take(20).collect();
        let b: Vec<_> = EventGenerator::with_defaults(Some(42)).take(20).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_values_come_from_sets() {
        let mut generator = EventGenerator::with_defaults(Some(7));
        let values = generator.values().clone();
        for (key, event) in generator.by_ref().take(200) {
            assert!(values.keys.contains(&key));
            assert!(values.users.contains(&event.user));
            assert!(values.vehicles.contains(&event.vehicle));
            assert!(values.colors.contains(&event.color));
        }
    }

    #[test]
    fn test_every_value_is_reachable() {
        let mut generator = EventGenerator::with_defaults(Some(1));
        let mut keys = HashSet::new();
        let mut users = HashSet::new();
        let mut colors = HashSet::new();
        for (key, event) in generator.by_ref().take(2000) {
            keys.insert(key);
            users.insert(event.user);
            colors.insert(event.color);
        }
        // The last element of each set must be drawable too
        assert!(keys.contains("Key-4"));
        assert!(users.contains("Kevin"));
        assert!(colors.contains("Gray"));
        assert_eq!(keys.len(), 4);
        assert_eq!(users.len(), 5);
        assert_eq!(colors.len(), 6);
    }

    #[test]
    fn test_empty_value_set_is_rejected() {
        let values = ValueSets {
            vehicles: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(
            EventGenerator::new(values, None),
            Err(GeneratorError::EmptyValueSet("vehicles"))
        ));
    }

    #[test]
    fn test_custom_single_value_sets() {
        let values = ValueSets {
            keys: vec!["only".to_string()],
            users: vec!["Ann".to_string()],
            vehicles: vec!["Saab".to_string()],
            colors: vec!["Teal".to_string()],
        };
        let mut generator = EventGenerator::new(values, Some(3)).unwrap();
        assert_eq!(
            generator.next(),
            Some(("only".to_string(), Event::new("Ann", "Saab", "Teal")))
        );
    }
}
