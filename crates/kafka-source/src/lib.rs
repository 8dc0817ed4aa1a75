//! Kafka subscriber for vehicle-stats.
//!
//! Pulls schema-tagged records for a consumer group, decodes them with the
//! [`SchemaCodec`](schema_codec::SchemaCodec), relays each decoded event to
//! the stats server and then commits the record's offset.
//!
//! # Delivery
//!
//! Offsets are committed after the relay attempt, whether it succeeded or
//! not. A crash between relay and commit redelivers the record, so the stats
//! server sees every record at least once; a failed relay loses that record's
//! statistics but never the record itself, which stays on the log and can be
//! replayed from an earlier offset.
//!
//! # Concurrency
//!
//! Each consumer in the group runs one sequential pull, process, commit loop.
//! In-flight relay calls are therefore bounded by the number of consumers and
//! commits within a partition happen in offset order.

/// High-level API for spawning subscriber tasks
///
/// Takes the consumer config, codec and relay, and creates one or more
/// consumers in the same consumer group, each running in its own async task.
pub mod client;

/// Low-level consumer with manual offset commits
pub mod consumer;
pub mod error;
pub mod memory;
pub mod record;
pub mod relay;
pub mod subscriber;

pub use client::Client;
pub use consumer::{ConsumerConfig, KafkaConsumer, RecordSource};
pub use error::{RelayError, Result, SourceError};
pub use memory::MemorySource;
pub use record::LogRecord;
pub use relay::{HttpRelay, Relay, RelayConfig};
pub use subscriber::{Outcome, Subscriber, SubscriberStats};
