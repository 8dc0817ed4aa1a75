//! Produce to a real topic, consume it back through a consumer group and
//! check the stats server's counters.

use schema_codec::{MemorySchemaRegistry, SchemaCodec};
use stats_server::{server::bind, serve, Aggregator};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use vehicle_stats_kafka_producer::{run_producer, KafkaSink, Partitioner, ProducerConfig, Publisher};
use vehicle_stats_kafka_source::{Client, ConsumerConfig, HttpRelay, RelayConfig, SubscriberStats};

const EVENTS: u64 = 20;

fn broker() -> String {
    std::env::var("KAFKA_BROKER").unwrap_or_else(|_| "kafka:9092".to_string())
}

#[tokio::test]
#[ignore = "requires a Kafka broker"]
async fn test_kafka_round_trip() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("vehicle_stats=debug,vehicle_stats_kafka_source=debug")
        .try_init()
        .ok();

    let topic = format!(
        "vehicle-stats-test-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)?
            .as_millis()
    );
    let codec = Arc::new(SchemaCodec::new(Arc::new(MemorySchemaRegistry::new())));

    // Stats server
    let listener = bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?.to_string();
    let aggregator = Arc::new(Aggregator::new());
    let shutdown = CancellationToken::new();
    let server = tokio::spawn(serve(
        listener,
        Arc::clone(&aggregator),
        shutdown.clone(),
        Duration::from_secs(1),
    ));

    // Produce
    let sink = KafkaSink::new(&ProducerConfig::new(broker()))?;
    sink.ensure_topic(&topic, 3, 1).await?;
    let publisher = Publisher::new(sink, Arc::clone(&codec), Partitioner::Murmur2);
    let mut generator = event_generator::EventGenerator::with_defaults(Some(11));
    let produced = run_producer(
        &publisher,
        &mut generator,
        &topic,
        Duration::from_millis(10),
        Some(EVENTS),
        CancellationToken::new(),
        Duration::from_secs(1),
    )
    .await;
    assert_eq!(produced.published(), EVENTS);
    publisher.sink().flush(Duration::from_secs(5)).await?;

    // Consume with two group members
    let config = ConsumerConfig {
        brokers: broker(),
        group_id: format!("{topic}-group"),
        topic: topic.clone(),
        ..Default::default()
    };
    let relay = Arc::new(HttpRelay::new(&RelayConfig::new(address))?);
    let client = Client::new(config, Arc::clone(&codec), relay);
    assert_eq!(client.check_connection().await?, 3);

    let stats = Arc::new(SubscriberStats::default());
    let handles = client.spawn_subscriber_group(2, Arc::clone(&stats), shutdown.clone())?;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(60);
    while aggregator.snapshot().await.total < EVENTS {
        assert!(
            tokio::time::Instant::now() < deadline,
            "only {} of {EVENTS} events arrived",
            aggregator.snapshot().await.total
        );
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    shutdown.cancel();
    for handle in handles {
        handle.await?;
    }
    server.await??;

    let snapshot = aggregator.snapshot().await;
    assert_eq!(snapshot.total, EVENTS);
    assert_eq!(snapshot.partition_sum(), EVENTS);
    assert_eq!(stats.relayed(), EVENTS);
    Ok(())
}
