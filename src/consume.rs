//! `consume` subcommand: relay events from a topic to the stats server.

use anyhow::Context;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use vehicle_stats_kafka_source::{Client, ConsumerConfig, HttpRelay, RelayConfig, SubscriberStats};

use crate::config::{parse_duration, ConfigError, RegistryOpts, TlsOpts};
use crate::lifecycle::Lifecycle;

#[derive(Args, Clone, Debug)]
pub struct ConsumeArgs {
    /// Kafka brokers (comma-separated list)
    #[arg(long, env = "BOOTSTRAP_SERVERS", default_value = "localhost:9092")]
    pub brokers: String,

    /// Topic to consume from
    #[arg(long, env = "TOPIC")]
    pub topic: String,

    /// Consumer group ID
    #[arg(long, env = "GROUP_ID", default_value = "vehicle-stats-consumer")]
    pub group_id: String,

    /// Stats server address (`host:port` or URL); `/stats` is appended
    #[arg(long, env = "OUT_ADDRESS", default_value = "localhost:8080")]
    pub out_address: String,

    /// Bound on a single relay call
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub relay_timeout: Duration,

    /// Number of consumers to run in the group
    #[arg(long, default_value_t = 1)]
    pub num_consumers: usize,

    /// Where to start when the group has no committed offset ("earliest" or "latest")
    #[arg(long, default_value = "earliest")]
    pub auto_offset_reset: String,

    /// Consumer session timeout
    #[arg(long, default_value = "6s", value_parser = parse_duration)]
    pub session_timeout: Duration,

    /// Timeout for the startup broker check
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub connect_timeout: Duration,

    #[command(flatten)]
    pub registry: RegistryOpts,

    #[command(flatten)]
    pub tls: TlsOpts,
}

impl ConsumeArgs {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_consumers == 0 {
            return Err(ConfigError::NotPositive("--num-consumers"));
        }
        if self.relay_timeout.is_zero() {
            return Err(ConfigError::NotPositive("--relay-timeout"));
        }
        self.tls.validate()
    }

    fn consumer_config(&self) -> Result<ConsumerConfig, ConfigError> {
        Ok(ConsumerConfig {
            brokers: self.brokers.clone(),
            group_id: self.group_id.clone(),
            topic: self.topic.clone(),
            auto_offset_reset: self.auto_offset_reset.clone(),
            session_timeout_ms: self.session_timeout.as_millis().to_string(),
            connect_timeout: self.connect_timeout,
            client_properties: self.tls.kafka_properties()?,
        })
    }
}

/// Run the subscriber group until shutdown.
pub async fn run(args: ConsumeArgs, lifecycle: &Lifecycle) -> anyhow::Result<()> {
    args.validate()?;
    tracing::info!("Starting {} consumer(s) for topic '{}'", args.num_consumers, args.topic);
    tracing::info!("Brokers: {}, group: {}", args.brokers, args.group_id);
    tracing::info!("Relaying to {}", args.out_address);

    let codec = Arc::new(args.registry.codec(&args.tls)?);
    codec
        .preflight()
        .await
        .context("Schema registry is unreachable")?;

    let relay = HttpRelay::new(&RelayConfig {
        address: args.out_address.clone(),
        timeout: args.relay_timeout,
    })
    .context("Invalid stats server address")?;
    tracing::debug!("Relay endpoint: {}", relay.endpoint());

    let client = Client::new(args.consumer_config()?, codec, Arc::new(relay));
    let partitions = client
        .check_connection()
        .await
        .context("Failed to connect to Kafka")?;
    if partitions == 0 {
        tracing::warn!("Topic '{}' not found; waiting for it to appear", args.topic);
    } else {
        tracing::info!("Topic '{}' has {partitions} partition(s)", args.topic);
    }

    let stats = Arc::new(SubscriberStats::default());
    let handles = client
        .spawn_subscriber_group(args.num_consumers, Arc::clone(&stats), lifecycle.token())
        .context("Failed to start consumers")?;

    lifecycle.drain(handles).await;
    tracing::info!(
        processed = stats.processed(),
        relayed = stats.relayed(),
        relay_failures = stats.relay_failures(),
        decode_failures = stats.decode_failures(),
        commit_failures = stats.commit_failures(),
        fetch_errors = stats.fetch_errors(),
        "Consumers stopped"
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
        args: ConsumeArgs,
    }

    fn parse(extra: &[&str]) -> ConsumeArgs {
        let mut argv = vec!["test", "--topic", "cars"];
        argv.extend_from_slice(extra);
        Wrapper::parse_from(argv).args
    }

    #[test]
    fn test_consumer_config_from_args() {
        let args = parse(&["--group-id", "stats", "--session-timeout", "10s"]);
        let config = args.consumer_config().unwrap();
        assert_eq!(config.group_id, "stats");
        assert_eq!(config.topic, "cars");
        assert_eq!(config.session_timeout_ms, "10000");
        assert_eq!(config.auto_offset_reset, "earliest");
        assert!(config.client_properties.is_empty());
    }

    #[test]
    fn test_zero_consumers_is_rejected() {
        let args = parse(&["--num-consumers", "0"]);
        assert!(matches!(
            args.validate(),
            Err(ConfigError::NotPositive("--num-consumers"))
        ));
    }

    #[test]
    fn test_key_without_certificate_is_rejected() {
        let args = parse(&["--ssl-key-location", "/client.key"]);
        assert!(matches!(
            args.validate(),
            Err(ConfigError::IncompleteClientCert)
        ));
    }
}
