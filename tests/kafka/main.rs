//! Kafka E2E tests
//!
//! Need a reachable broker (`KAFKA_BROKER`, default `kafka:9092`) and are
//! ignored by default. Run with `cargo test --test kafka -- --ignored`.

mod live_pipeline;
