use crate::consumer::RecordSource;
use crate::error::SourceError;
use crate::record::LogRecord;
use crate::relay::Relay;
use schema_codec::SchemaCodec;
use stats_types::RelayPayload;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const FETCH_BACKOFF: Duration = Duration::from_millis(500);

/// What happened to a single record. Its offset is committed in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Decoded and accepted by the stats server.
    Relayed,
    /// Decoded, but the relay call failed; the event's statistics are lost.
    RelayFailed,
    /// Could not be decoded; dropped from statistics.
    Undecodable,
}

/// Counters shared by every subscriber in a group.
#[derive(Debug, Default)]
pub struct SubscriberStats {
    processed: AtomicU64,
    relayed: AtomicU64,
    relay_failures: AtomicU64,
    decode_failures: AtomicU64,
    commit_failures: AtomicU64,
    fetch_errors: AtomicU64,
}

impl SubscriberStats {
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn relayed(&self) -> u64 {
        self.relayed.load(Ordering::Relaxed)
    }

    pub fn relay_failures(&self) -> u64 {
        self.relay_failures.load(Ordering::Relaxed)
    }

    pub fn decode_failures(&self) -> u64 {
        self.decode_failures.load(Ordering::Relaxed)
    }

    pub fn commit_failures(&self) -> u64 {
        self.commit_failures.load(Ordering::Relaxed)
    }

    pub fn fetch_errors(&self) -> u64 {
        self.fetch_errors.load(Ordering::Relaxed)
    }

    fn record(&self, outcome: Outcome) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            Outcome::Relayed => &self.relayed,
            Outcome::RelayFailed => &self.relay_failures,
            Outcome::Undecodable => &self.decode_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// One sequential pull, decode, relay, commit loop.
pub struct Subscriber<S: RecordSource, R: Relay> {
    source: S,
    codec: Arc<SchemaCodec>,
    relay: Arc<R>,
    stats: Arc<SubscriberStats>,
}

impl<S: RecordSource, R: Relay> Subscriber<S, R> {
    pub fn new(source: S, codec: Arc<SchemaCodec>, relay: Arc<R>) -> Self {
        Self {
            source,
            codec,
            relay,
            stats: Arc::new(SubscriberStats::default()),
        }
    }

    /// Share counters with other subscribers.
    pub fn with_stats(mut self, stats: Arc<SubscriberStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> &Arc<SubscriberStats> {
        &self.stats
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Decode one record and relay it. Never fails; the outcome is logged.
    pub async fn process_record(&self, record: &LogRecord) -> Outcome {
        let Some(value) = record.value.as_deref() else {
            warn!(
                topic = %record.topic,
                partition = record.partition,
                offset = record.offset,
                key = %record.key_lossy(),
                "Dropping record without a value"
            );
            return Outcome::Undecodable;
        };

        let event = match self.codec.deserialize(&record.topic, value).await {
            Ok(event) => event,
            Err(e) => {
                error!(
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    key = %record.key_lossy(),
                    "Failed to decode record: {e}"
                );
                return Outcome::Undecodable;
            }
        };

        let payload = RelayPayload::new(
            &record.topic,
            record.partition,
            record.key.as_deref(),
            event,
        );

        match self.relay.relay(&payload).await {
            Ok(()) => {
                debug!(
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    key = %payload.key,
                    event = %payload.message,
                    "relayed"
                );
                Outcome::Relayed
            }
            Err(e) => {
                error!(
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    key = %payload.key,
                    "Failed to relay event: {e}"
                );
                Outcome::RelayFailed
            }
        }
    }

    /// Run until `shutdown` fires or the source closes.
    ///
    /// A record already pulled is always processed and committed before the
    /// loop looks at `shutdown` again.
    pub async fn run(&self, shutdown: CancellationToken) {
        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!("Subscriber stopping on shutdown");
                    break;
                }
                next = self.source.next_record() => next,
            };

            let record = match next {
                Ok(record) => record,
                Err(SourceError::Closed) => {
                    info!("Record source closed");
                    break;
                }
                Err(e) => {
                    self.stats.fetch_errors.fetch_add(1, Ordering::Relaxed);
                    warn!("Failed to fetch record: {e}");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(FETCH_BACKOFF) => continue,
                    }
                }
            };

            let outcome = self.process_record(&record).await;
            self.stats.record(outcome);

            if let Err(e) = self.source.commit(&record).await {
                self.stats.commit_failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    "Failed to commit offset: {e}"
                );
            }
        }
    }
}
