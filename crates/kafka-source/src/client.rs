use crate::consumer::{ConsumerConfig, KafkaConsumer};
use crate::error::Result;
use crate::relay::Relay;
use crate::subscriber::{Subscriber, SubscriberStats};
use schema_codec::SchemaCodec;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Kafka client for managing a group of subscribers
pub struct Client<R: Relay> {
    config: ConsumerConfig,
    codec: Arc<SchemaCodec>,
    relay: Arc<R>,
}

impl<R: Relay + 'static> Client<R> {
    pub fn new(config: ConsumerConfig, codec: Arc<SchemaCodec>, relay: Arc<R>) -> Self {
        Self {
            config,
            codec,
            relay,
        }
    }

    /// Create a single consumer
    pub fn create_consumer(&self) -> Result<KafkaConsumer> {
        KafkaConsumer::new(self.config.clone())
    }

    /// Create a consumer and prove the brokers answer before any task starts.
    ///
    /// Returns the topic's partition count.
    pub async fn check_connection(&self) -> Result<usize> {
        self.create_consumer()?.check_connection().await
    }

    /// Spawn one subscriber task, logging under a `subscriber{consumer=index}` span
    pub fn spawn_subscriber(
        &self,
        index: usize,
        stats: Arc<SubscriberStats>,
        shutdown: CancellationToken,
    ) -> Result<JoinHandle<()>> {
        let consumer = self.create_consumer()?;
        let subscriber = Subscriber::new(consumer, Arc::clone(&self.codec), Arc::clone(&self.relay))
            .with_stats(stats);
        let span = tracing::info_span!(
            "subscriber",
            consumer = index,
            topic = %self.config.topic,
            group = %self.config.group_id
        );

        Ok(tokio::spawn(
            async move { subscriber.run(shutdown).await }.instrument(span),
        ))
    }

    /// Spawn multiple subscriber tasks in the same consumer group
    ///
    /// When spawning multiple consumers:
    /// - All consumers join the same consumer group (same `group_id`)
    /// - Kafka assigns different partitions of the specified topic to each consumer
    /// - Each partition is processed by exactly one consumer
    /// - Consumers beyond the partition count sit idle until a rebalance
    pub fn spawn_subscriber_group(
        &self,
        num_consumers: usize,
        stats: Arc<SubscriberStats>,
        shutdown: CancellationToken,
    ) -> Result<Vec<JoinHandle<()>>> {
        let mut handles = Vec::new();

        for index in 0..num_consumers.max(1) {
            let handle = self.spawn_subscriber(index, Arc::clone(&stats), shutdown.clone())?;
            handles.push(handle);
        }

        Ok(handles)
    }

    /// Get the config
    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }
}
