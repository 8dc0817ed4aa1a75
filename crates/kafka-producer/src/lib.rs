//! Kafka publishing for vehicle-stats.
//!
//! This library turns generated [`Event`](stats_types::Event)s into
//! schema-tagged log records and appends them to a Kafka topic.
//!
//! ## Features
//!
//! - **Schema-governed values**: every value goes through
//!   [`SchemaCodec`](schema_codec::SchemaCodec) before it reaches the log
//! - **Deterministic routing**: the partition is computed client-side from the
//!   key, so the same key always lands on the same partition
//! - **Bounded sends**: every publish carries a timeout and fails visibly
//! - **Topic management**: create the topic if it does not exist
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use schema_codec::{HttpRegistryConfig, HttpSchemaRegistry, SchemaCodec};
//! use stats_types::Event;
//! use vehicle_stats_kafka_producer::{KafkaSink, Partitioner, ProducerConfig, Publisher};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = HttpSchemaRegistry::new(&HttpRegistryConfig::new("localhost:8081"))?;
//!     let codec = Arc::new(SchemaCodec::new(Arc::new(registry)));
//!     let sink = KafkaSink::new(&ProducerConfig::new("localhost:9092"))?;
//!
//!     let publisher = Publisher::new(sink, codec, Partitioner::Fnv1a);
//!     publisher.publish("cars", b"Key-1", &Event::new("John", "Kia", "Red")).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod partitioner;
pub mod publisher;
pub mod runner;
pub mod sink;

pub use error::{PublishError, Result};
pub use partitioner::Partitioner;
pub use publisher::{Published, Publisher};
pub use runner::{run_producer, ProducerStats};
pub use sink::{KafkaSink, MemorySink, ProducerConfig, RecordSink, SentRecord};
