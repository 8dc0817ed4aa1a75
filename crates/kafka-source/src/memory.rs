//! In-process record source for tests and local runs.

use crate::consumer::RecordSource;
use crate::error::{Result, SourceError};
use crate::record::LogRecord;
use std::collections::BTreeMap;
use tokio::sync::{mpsc, Mutex};

/// Channel-backed [`RecordSource`].
///
/// Records pushed through [`MemorySource::sender`] are yielded in order. Once
/// every sender is dropped and the channel drains, `next_record` returns
/// [`SourceError::Closed`].
pub struct MemorySource {
    rx: Mutex<mpsc::UnboundedReceiver<LogRecord>>,
    tx: Mutex<Option<mpsc::UnboundedSender<LogRecord>>>,
    committed: Mutex<BTreeMap<(String, i32), i64>>,
    commit_log: Mutex<Vec<(i32, i64)>>,
}

impl MemorySource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            rx: Mutex::new(rx),
            tx: Mutex::new(Some(tx)),
            committed: Mutex::new(BTreeMap::new()),
            commit_log: Mutex::new(Vec::new()),
        }
    }

    /// Build a source that yields `records` and then closes.
    pub fn from_records(records: impl IntoIterator<Item = LogRecord>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        for record in records {
            // The receiver is alive here so the send cannot fail
            let _ = tx.send(record);
        }
        Self {
            rx: Mutex::new(rx),
            tx: Mutex::new(None),
            committed: Mutex::new(BTreeMap::new()),
            commit_log: Mutex::new(Vec::new()),
        }
    }

    /// A handle for pushing records; `None` once [`MemorySource::close`] was called.
    pub async fn sender(&self) -> Option<mpsc::UnboundedSender<LogRecord>> {
        self.tx.lock().await.clone()
    }

    /// Drop the source's own sender so the channel closes when drained.
    pub async fn close(&self) {
        self.tx.lock().await.take();
    }

    /// Next offset to read for `topic`/`partition`, as a Kafka commit would store it.
    pub async fn committed(&self, topic: &str, partition: i32) -> Option<i64> {
        self.committed
            .lock()
            .await
            .get(&(topic.to_string(), partition))
            .copied()
    }

    /// Every commit in call order as `(partition, record offset)`.
    pub async fn commit_log(&self) -> Vec<(i32, i64)> {
        self.commit_log.lock().await.clone()
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RecordSource for MemorySource {
    async fn next_record(&self) -> Result<LogRecord> {
        self.rx.lock().await.recv().await.ok_or(SourceError::Closed)
    }

    async fn commit(&self, record: &LogRecord) -> Result<()> {
        self.committed
            .lock()
            .await
            .insert((record.topic.clone(), record.partition), record.offset + 1);
        self.commit_log
            .lock()
            .await
            .push((record.partition, record.offset));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(partition: i32, offset: i64) -> LogRecord {
        LogRecord {
            topic: "cars".to_string(),
            partition,
            offset,
            key: None,
            value: None,
            timestamp: None,
        }
    }

    #[tokio::test]
    async fn test_yields_records_then_closes() {
        let source = MemorySource::from_records([record(0, 0), record(0, 1)]);
        assert_eq!(source.next_record().await.unwrap().offset, 0);
        assert_eq!(source.next_record().await.unwrap().offset, 1);
        assert!(matches!(source.next_record().await, Err(SourceError::Closed)));
    }

    #[tokio::test]
    async fn test_commit_stores_next_offset() {
        let source = MemorySource::new();
        source.commit(&record(2, 41)).await.unwrap();
        assert_eq!(source.committed("cars", 2).await, Some(42));
        assert_eq!(source.committed("cars", 0).await, None);
        assert_eq!(source.commit_log().await, vec![(2, 41)]);
    }

    #[tokio::test]
    async fn test_close_ends_stream_after_pending_records() {
        let source = MemorySource::new();
        let tx = source.sender().await.unwrap();
        tx.send(record(1, 7)).unwrap();
        drop(tx);
        source.close().await;

        assert_eq!(source.next_record().await.unwrap().offset, 7);
        assert!(matches!(source.next_record().await, Err(SourceError::Closed)));
        assert!(source.sender().await.is_none());
    }
}
