//! Serialize, route and append a single event.

use crate::error::{PublishError, Result};
use crate::partitioner::Partitioner;
use crate::sink::RecordSink;
use schema_codec::SchemaCodec;
use stats_types::Event;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Where a published event ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Published {
    pub partition: i32,
    pub schema_id: u32,
}

/// Publishes events to a [`RecordSink`].
///
/// Partition counts are fetched once per topic and cached, so routing stays
/// fixed for the life of the publisher.
pub struct Publisher<S: RecordSink> {
    sink: S,
    codec: Arc<SchemaCodec>,
    partitioner: Partitioner,
    timeout: Duration,
    partitions: RwLock<HashMap<String, i32>>,
}

impl<S: RecordSink> Publisher<S> {
    pub fn new(sink: S, codec: Arc<SchemaCodec>, partitioner: Partitioner) -> Self {
        Self {
            sink,
            codec,
            partitioner,
            timeout: Duration::from_secs(5),
            partitions: RwLock::new(HashMap::new()),
        }
    }

    /// Upper bound on a single append, including the broker acknowledgement.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Partition `key` will be written to on `topic`.
    pub async fn route(&self, topic: &str, key: &[u8]) -> Result<i32> {
        let partitions = self.partition_count(topic).await?;
        Ok(self.partitioner.partition(key, partitions))
    }

    /// Serialize `event` and append it to `topic` under `key`.
    pub async fn publish(&self, topic: &str, key: &[u8], event: &Event) -> Result<Published> {
        let envelope = self.codec.serialize(topic, event).await?;
        let partition = self.route(topic, key).await?;
        let value = envelope.to_bytes();

        tokio::time::timeout(
            self.timeout,
            self.sink.send(topic, partition, key, &value),
        )
        .await
        .map_err(|_| PublishError::Timeout(self.timeout))??;

        Ok(Published {
            partition,
            schema_id: envelope.schema_id,
        })
    }

    async fn partition_count(&self, topic: &str) -> Result<i32> {
        if let Some(count) = self.partitions.read().await.get(topic) {
            return Ok(*count);
        }
        let count = self.sink.partition_count(topic).await?;
        tracing::debug!("Topic '{topic}' has {count} partitions");
        self.partitions
            .write()
            .await
            .insert(topic.to_string(), count);
        Ok(count)
    }
}
