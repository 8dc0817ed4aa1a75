//! Vehicle Stats
//!
//! Synthetic "someone bought a car" events flow from a generator, through a
//! schema registry governed Kafka topic, to a subscriber group that relays
//! each event to an in-memory statistics server.
//!
//! # Components
//!
//! - `event_generator` - seeded random events and routing keys
//! - `schema_codec` - registry-tagged JSON wire format
//! - `vehicle_stats_kafka_producer` - partitioned, timed publishing
//! - `vehicle_stats_kafka_source` - pull, relay, commit loop per consumer
//! - `stats_server` - the aggregator and its HTTP API
//!
//! # CLI Usage
//!
//! ```bash
//! # Statistics server
//! vehicle-stats serve --listen-address 0.0.0.0:8080
//!
//! # Relay events from the topic to the server
//! vehicle-stats consume --brokers localhost:9092 --topic cars --out-address localhost:8080
//!
//! # Publish one event per second
//! vehicle-stats produce --brokers localhost:9092 --topic cars --create-topic
//! ```

pub mod config;
pub mod consume;
pub mod lifecycle;
pub mod logging;
pub mod produce;
pub mod serve;

pub use config::ConfigError;
pub use consume::ConsumeArgs;
pub use lifecycle::Lifecycle;
pub use produce::ProduceArgs;
pub use serve::ServeArgs;
