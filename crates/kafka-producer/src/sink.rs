//! Where published records go.

use crate::error::{PublishError, Result};
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::ClientConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// Append-only destination for keyed records with an explicit partition.
#[async_trait::async_trait]
pub trait RecordSink: Send + Sync {
    /// Number of partitions of `topic`.
    async fn partition_count(&self, topic: &str) -> Result<i32>;

    /// Append one record and wait for the broker's acknowledgement.
    async fn send(&self, topic: &str, partition: i32, key: &[u8], value: &[u8]) -> Result<()>;
}

/// Configuration for the Kafka producer.
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Kafka brokers (comma-separated list)
    pub brokers: String,
    /// Upper bound on local queueing plus delivery of a single record.
    ///
    /// Mapped to librdkafka's `message.timeout.ms`, so a record that cannot be
    /// delivered in time fails with a timeout instead of hanging.
    pub message_timeout: Duration,
    /// Timeout for metadata and admin requests
    pub request_timeout: Duration,
    /// Extra librdkafka properties (TLS settings and the like)
    pub client_properties: Vec<(String, String)>,
}

impl ProducerConfig {
    pub fn new(brokers: impl Into<String>) -> Self {
        Self {
            brokers: brokers.into(),
            message_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            client_properties: Vec::new(),
        }
    }

    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", &self.brokers);
        for (key, value) in &self.client_properties {
            config.set(key, value);
        }
        config
    }
}

/// [`RecordSink`] backed by an rdkafka [`FutureProducer`].
pub struct KafkaSink {
    producer: FutureProducer,
    config: ProducerConfig,
}

impl KafkaSink {
    pub fn new(config: &ProducerConfig) -> Result<Self> {
        let producer: FutureProducer = config
            .client_config()
            .set(
                "message.timeout.ms",
                config.message_timeout.as_millis().to_string(),
            )
            .create()?;

        Ok(Self {
            producer,
            config: config.clone(),
        })
    }

    /// Create `topic` if it doesn't exist.
    pub async fn ensure_topic(&self, topic: &str, partitions: i32, replication: i32) -> Result<()> {
        let admin_client: AdminClient<DefaultClientContext> =
            self.config.client_config().create()?;

        let new_topic = NewTopic::new(topic, partitions, TopicReplication::Fixed(replication));
        let opts = AdminOptions::new().operation_timeout(Some(self.config.request_timeout));

        let results = admin_client
            .create_topics(&[new_topic], &opts)
            .await
            .map_err(|e| PublishError::TopicCreation(format!("Failed to create topics: {e}")))?;

        for result in results {
            match result {
                Ok(topic_name) => {
                    tracing::info!("Topic '{topic_name}' created successfully");
                }
                Err((topic_name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                    tracing::info!("Topic '{topic_name}' already exists");
                }
                Err((topic_name, err)) => {
                    return Err(PublishError::TopicCreation(format!(
                        "Failed to create topic {topic_name}: {err}"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Wait up to `timeout` for queued records to be delivered.
    pub async fn flush(&self, timeout: Duration) -> Result<()> {
        let producer = self.producer.clone();

        // librdkafka's flush blocks the calling thread
        tokio::task::spawn_blocking(move || producer.flush(timeout))
            .await
            .map_err(|e| PublishError::Flush(format!("flush task failed: {e}")))??;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordSink for KafkaSink {
    async fn partition_count(&self, topic: &str) -> Result<i32> {
        let producer = self.producer.clone();
        let topic = topic.to_string();
        let timeout = self.config.request_timeout;

        // Metadata requests block the calling thread
        tokio::task::spawn_blocking(move || {
            let metadata = producer.client().fetch_metadata(Some(topic.as_str()), timeout)?;
            let entry = metadata
                .topics()
                .iter()
                .find(|t| t.name() == topic)
                .ok_or_else(|| PublishError::Metadata(format!("topic '{topic}' not in metadata")))?;
            if let Some(err) = entry.error() {
                return Err(PublishError::Metadata(format!(
                    "topic '{topic}': {}",
                    RDKafkaErrorCode::from(err)
                )));
            }
            match entry.partitions().len() {
                0 => Err(PublishError::Metadata(format!(
                    "topic '{topic}' has no partitions"
                ))),
                n => Ok(n as i32),
            }
        })
        .await
        .map_err(|e| PublishError::Metadata(format!("metadata task failed: {e}")))?
    }

    async fn send(&self, topic: &str, partition: i32, key: &[u8], value: &[u8]) -> Result<()> {
        let record = FutureRecord::to(topic)
            .partition(partition)
            .key(key)
            .payload(value);

        self.producer
            .send(record, self.config.message_timeout)
            .await
            .map(|_| ())
            .map_err(|(err, _)| match err {
                KafkaError::MessageProduction(RDKafkaErrorCode::MessageTimedOut) => {
                    PublishError::Timeout(self.config.message_timeout)
                }
                other => PublishError::Kafka(other),
            })
    }
}

/// A record captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRecord {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// In-memory [`RecordSink`] with a fixed partition count.
///
/// Offsets are assigned per partition starting at 0. Sends can be made to
/// fail to exercise error paths.
pub struct MemorySink {
    partitions: i32,
    records: Mutex<Vec<SentRecord>>,
    failures_remaining: AtomicUsize,
    metadata_calls: AtomicUsize,
}

impl MemorySink {
    pub fn new(partitions: i32) -> Self {
        Self {
            partitions,
            records: Mutex::new(Vec::new()),
            failures_remaining: AtomicUsize::new(0),
            metadata_calls: AtomicUsize::new(0),
        }
    }

    /// Fail the next `count` sends with a broker error.
    pub fn fail_next(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    pub async fn records(&self) -> Vec<SentRecord> {
        self.records.lock().await.clone()
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RecordSink for MemorySink {
    async fn partition_count(&self, _topic: &str) -> Result<i32> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.partitions)
    }

    async fn send(&self, topic: &str, partition: i32, key: &[u8], value: &[u8]) -> Result<()> {
        let failing = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(PublishError::Kafka(KafkaError::MessageProduction(
                RDKafkaErrorCode::BrokerNotAvailable,
            )));
        }

        let mut records = self.records.lock().await;
        let offset = records.iter().filter(|r| r.partition == partition).count() as i64;
        records.push(SentRecord {
            topic: topic.to_string(),
            partition,
            offset,
            key: key.to_vec(),
            value: value.to_vec(),
        });
        Ok(())
    }
}
