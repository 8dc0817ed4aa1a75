use crate::error::{Result, SourceError};
use crate::record::LogRecord;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{
    CommitMode, Consumer as RdkafkaConsumer, StreamConsumer as RdkafkaStreamConsumer,
};
use rdkafka::message::{BorrowedMessage as RdkafkaBorrowedMessage, Message as RdkafkaMessage};
use rdkafka::{Offset, TopicPartitionList};
use std::sync::Arc;
use std::time::Duration;

/// A source of log records with explicit, per-record offset commits.
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    /// Wait for the next record.
    ///
    /// Returns [`SourceError::Closed`] once no further records can arrive.
    async fn next_record(&self) -> Result<LogRecord>;

    /// Mark `record` and everything before it in its partition as consumed.
    async fn commit(&self, record: &LogRecord) -> Result<()>;
}

/// Configuration for Kafka consumer
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Kafka brokers (comma-separated list)
    pub brokers: String,
    /// Consumer group ID
    pub group_id: String,
    /// Topic to consume from
    ///
    /// Every value must be a schema-tagged event whose schema is registered
    /// under this topic's subject.
    pub topic: String,
    /// Auto offset reset strategy ("earliest" or "latest")
    ///
    /// "earliest" means the consumer will start from the beginning of the topic
    /// if no committed offsets are found for the consumer group.
    /// "latest" means the consumer will start from the end of the topic.
    pub auto_offset_reset: String,
    /// Session timeout in milliseconds
    pub session_timeout_ms: String,
    /// Timeout for the startup connection check
    pub connect_timeout: Duration,
    /// Extra librdkafka properties (TLS settings and the like)
    pub client_properties: Vec<(String, String)>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            group_id: "vehicle-stats-consumer".to_string(),
            topic: "".to_string(),
            auto_offset_reset: "earliest".to_string(),
            session_timeout_ms: "6000".to_string(),
            connect_timeout: Duration::from_secs(10),
            client_properties: Vec::new(),
        }
    }
}

impl ConsumerConfig {
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &self.brokers)
            .set("group.id", &self.group_id)
            // Offsets are committed by hand after each relay attempt
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", &self.auto_offset_reset)
            .set("session.timeout.ms", &self.session_timeout_ms)
            .set("enable.partition.eof", "false");
        for (key, value) in &self.client_properties {
            config.set(key, value);
        }
        config
    }
}

/// Kafka consumer with manual offset management
pub struct KafkaConsumer {
    consumer: Arc<RdkafkaStreamConsumer>,
    config: ConsumerConfig,
}

impl KafkaConsumer {
    /// Create a new Kafka consumer subscribed to the configured topic
    pub fn new(config: ConsumerConfig) -> Result<Self> {
        if config.topic.is_empty() {
            return Err(SourceError::InvalidConfig("topic must not be empty".into()));
        }

        let consumer: RdkafkaStreamConsumer = config
            .client_config()
            .create()
            .map_err(|e| SourceError::Consumer(format!("Failed to create consumer: {e}")))?;

        consumer
            .subscribe(&[&config.topic])
            .map_err(|e| SourceError::Consumer(format!("Failed to subscribe to topic: {e}")))?;

        Ok(Self {
            consumer: Arc::new(consumer),
            config,
        })
    }

    /// Fetch the topic's metadata to prove the brokers are reachable.
    ///
    /// Creating a consumer does not touch the network, so without this an
    /// unreachable cluster would only show up as a stream of fetch errors.
    pub async fn check_connection(&self) -> Result<usize> {
        let consumer = Arc::clone(&self.consumer);
        let topic = self.config.topic.clone();
        let timeout = self.config.connect_timeout;

        tokio::task::spawn_blocking(move || -> Result<usize> {
            let metadata = consumer.fetch_metadata(Some(topic.as_str()), timeout)?;
            Ok(metadata
                .topics()
                .iter()
                .find(|t| t.name() == topic)
                .map(|t| t.partitions().len())
                .unwrap_or(0))
        })
        .await
        .map_err(|e| SourceError::Consumer(format!("Connection check task failed: {e}")))?
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    fn to_record(msg: &RdkafkaBorrowedMessage) -> LogRecord {
        LogRecord {
            topic: msg.topic().to_string(),
            partition: msg.partition(),
            offset: msg.offset(),
            key: msg.key().map(|k| k.to_vec()),
            value: msg.payload().map(|p| p.to_vec()),
            timestamp: msg.timestamp().to_millis(),
        }
    }
}

#[async_trait::async_trait]
impl RecordSource for KafkaConsumer {
    async fn next_record(&self) -> Result<LogRecord> {
        let msg = self
            .consumer
            .recv()
            .await
            .map_err(|e| SourceError::Consumer(format!("Error receiving message: {e}")))?;
        Ok(Self::to_record(&msg))
    }

    async fn commit(&self, record: &LogRecord) -> Result<()> {
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(
            &record.topic,
            record.partition,
            Offset::Offset(record.offset + 1),
        )
        .map_err(|e| SourceError::Consumer(format!("Failed to add partition offset: {e}")))?;

        self.consumer
            .commit(&tpl, CommitMode::Sync)
            .map_err(|e| SourceError::Consumer(format!("Failed to commit offset: {e}")))?;

        Ok(())
    }
}
