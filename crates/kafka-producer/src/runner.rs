//! Timed producer loop.

use crate::publisher::Publisher;
use crate::sink::RecordSink;
use event_generator::EventGenerator;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Counters for a producer run.
#[derive(Debug, Default)]
pub struct ProducerStats {
    published: AtomicU64,
    failed: AtomicU64,
}

impl ProducerStats {
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }
}

/// Publish one generated event per `interval` until `shutdown` fires or
/// `max_events` publish attempts have been made.
///
/// A failed publish is logged and the loop moves on to the next tick; retrying
/// is left to whoever reruns the producer. A publish already in flight when
/// shutdown fires gets up to `grace` to finish and is abandoned after that.
pub async fn run_producer<S: RecordSink>(
    publisher: &Publisher<S>,
    generator: &mut EventGenerator,
    topic: &str,
    interval: Duration,
    max_events: Option<u64>,
    shutdown: CancellationToken,
    grace: Duration,
) -> ProducerStats {
    let stats = ProducerStats::default();
    // interval() panics on a zero period
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Producing to topic '{topic}' every {interval:?}");

    let mut attempts = 0u64;
    loop {
        if max_events.is_some_and(|max| attempts >= max) {
            info!("Reached max_events limit ({attempts}), stopping");
            break;
        }

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("Shutdown requested, stopping producer");
                break;
            }
            _ = ticker.tick() => {}
        }

        attempts += 1;
        let key = generator.next_key();
        let event = generator.next_event();

        let result = tokio::select! {
            result = publisher.publish(topic, key.as_bytes(), &event) => result,
            _ = async {
                shutdown.cancelled().await;
                tokio::time::sleep(grace).await;
            } => {
                stats.failed.fetch_add(1, Ordering::SeqCst);
                warn!(
                    key = %key,
                    topic = %topic,
                    "Abandoning in-flight publish after {grace:?} grace period"
                );
                break;
            }
        };

        match result {
            Ok(published) => {
                stats.published.fetch_add(1, Ordering::SeqCst);
                info!(
                    key = %key,
                    partition = published.partition,
                    schema_id = published.schema_id,
                    event = %event,
                    "produced"
                );
            }
            Err(e) => {
                stats.failed.fetch_add(1, Ordering::SeqCst);
                error!(
                    key = %key,
                    topic = %topic,
                    retryable = e.is_retryable(),
                    "Failed to publish event: {e}"
                );
            }
        }
    }

    info!(
        "Producer stopped: {} published, {} failed",
        stats.published(),
        stats.failed()
    );
    stats
}
