//! `produce` subcommand: generate events and publish them to a topic.

use anyhow::Context;
use clap::Args;
use event_generator::EventGenerator;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use vehicle_stats_kafka_producer::{run_producer, KafkaSink, ProducerConfig, Publisher};

use crate::config::{
    parse_duration, ConfigError, PartitionerArg, RegistryOpts, SchemaPolicyArg, TlsOpts,
};
use crate::lifecycle::Lifecycle;

#[derive(Args, Clone, Debug)]
pub struct ProduceArgs {
    /// Kafka brokers (comma-separated list)
    #[arg(long, env = "KAFKA_URL", default_value = "localhost:9092")]
    pub brokers: String,

    /// Topic to publish to
    #[arg(long, env = "TOPIC")]
    pub topic: String,

    /// Time between published events
    #[arg(long, default_value = "1s", value_parser = parse_duration)]
    pub interval: Duration,

    /// Bound on a single publish, including broker acknowledgement
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub publish_timeout: Duration,

    /// Stop after this many publish attempts
    #[arg(long)]
    pub max_events: Option<u64>,

    /// Seed for a reproducible event stream
    #[arg(long, env = "GENERATOR_SEED")]
    pub seed: Option<u64>,

    /// How keys are mapped to partitions
    #[arg(long, value_enum, default_value_t = PartitionerArg::Fnv1a)]
    pub partitioner: PartitionerArg,

    /// What to do when the topic's subject has no schema yet
    #[arg(long, value_enum, default_value_t = SchemaPolicyArg::AutoRegister)]
    pub schema_policy: SchemaPolicyArg,

    /// Create the topic before producing if it does not exist
    #[arg(long)]
    pub create_topic: bool,

    /// Partitions for --create-topic
    #[arg(long, default_value_t = 3)]
    pub partitions: i32,

    /// Replication factor for --create-topic
    #[arg(long, default_value_t = 1)]
    pub replication_factor: i32,

    #[command(flatten)]
    pub registry: RegistryOpts,

    #[command(flatten)]
    pub tls: TlsOpts,
}

impl ProduceArgs {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::NotPositive("--interval"));
        }
        if self.publish_timeout.is_zero() {
            return Err(ConfigError::NotPositive("--publish-timeout"));
        }
        if self.create_topic && self.partitions <= 0 {
            return Err(ConfigError::NotPositive("--partitions"));
        }
        if self.create_topic && self.replication_factor <= 0 {
            return Err(ConfigError::NotPositive("--replication-factor"));
        }
        self.tls.validate()
    }

    fn producer_config(&self) -> Result<ProducerConfig, ConfigError> {
        let mut config = ProducerConfig::new(&self.brokers);
        config.message_timeout = self.publish_timeout;
        config.client_properties = self.tls.kafka_properties()?;
        Ok(config)
    }
}

/// Run the producer until shutdown or `--max-events`.
pub async fn run(args: ProduceArgs, lifecycle: &Lifecycle) -> anyhow::Result<()> {
    args.validate()?;
    tracing::info!("Starting producer for topic '{}'", args.topic);
    tracing::info!("Brokers: {}", args.brokers);
    tracing::info!("Schema registry: {}", args.registry.schema_registry_url);

    let codec = args
        .registry
        .codec(&args.tls)?
        .with_policy(args.schema_policy.into());
    codec
        .preflight()
        .await
        .context("Schema registry is unreachable")?;

    let sink = KafkaSink::new(&args.producer_config()?).context("Failed to create Kafka producer")?;
    if args.create_topic {
        sink.ensure_topic(&args.topic, args.partitions, args.replication_factor)
            .await
            .with_context(|| format!("Failed to create topic '{}'", args.topic))?;
    }

    let publisher = Publisher::new(sink, Arc::new(codec), args.partitioner.into())
        .with_timeout(args.publish_timeout);
    // Fetches and caches the partition count, proving the brokers answer
    publisher
        .route(&args.topic, b"")
        .await
        .with_context(|| format!("Failed to read metadata for topic '{}'", args.topic))?;

    let mut generator = EventGenerator::with_defaults(args.seed);
    let span = tracing::info_span!("producer", topic = %args.topic);
    let stats = run_producer(
        &publisher,
        &mut generator,
        &args.topic,
        args.interval,
        args.max_events,
        lifecycle.token(),
        lifecycle.grace(),
    )
    .instrument(span)
    .await;

    // Every completed publish has its delivery report already; after a
    // shutdown the grace period was spent inside the loop
    let flush_timeout = if lifecycle.token().is_cancelled() {
        Duration::ZERO
    } else {
        lifecycle.grace()
    };
    if let Err(e) = publisher.sink().flush(flush_timeout).await {
        tracing::warn!("Records still queued at exit: {e}");
    }
    tracing::info!(
        published = stats.published(),
        failed = stats.failed(),
        "Producer finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: ProduceArgs,
    }

    fn parse(extra: &[&str]) -> ProduceArgs {
        let mut argv = vec!["test", "--topic", "cars"];
        argv.extend_from_slice(extra);
        Wrapper::parse_from(argv).args
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.interval, Duration::from_secs(1));
        assert_eq!(args.publish_timeout, Duration::from_secs(5));
        assert_eq!(args.partitioner, PartitionerArg::Fnv1a);
        assert_eq!(args.schema_policy, SchemaPolicyArg::AutoRegister);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let args = parse(&["--interval", "0ms"]);
        assert!(matches!(
            args.validate(),
            Err(ConfigError::NotPositive("--interval"))
        ));
    }

    #[test]
    fn test_producer_config_carries_tls_and_timeout() {
        let args = parse(&["--publish-timeout", "250ms", "--ssl-ca-location", "/ca.pem"]);
        let config = args.producer_config().unwrap();
        assert_eq!(config.message_timeout, Duration::from_millis(250));
        assert!(config
            .client_properties
            .contains(&("security.protocol".to_string(), "ssl".to_string())));
    }
}
