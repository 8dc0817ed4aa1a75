//! Stats server tests over a real socket.

use stats_server::{serve, server::bind, Aggregator};
use stats_types::{Event, RelayPayload};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_concurrent_posts_then_graceful_shutdown() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt().with_env_filter("debug").try_init();

    let listener = bind("127.0.0.1:0").await?;
    let base = format!("http://{}", listener.local_addr()?);
    let aggregator = Arc::new(Aggregator::new());
    let shutdown = CancellationToken::new();
    let server = tokio::spawn(serve(
        listener,
        Arc::clone(&aggregator),
        shutdown.clone(),
        Duration::from_secs(1),
    ));

    let client = reqwest::Client::new();
    let mut posts = Vec::new();
    for i in 0..40 {
        let client = client.clone();
        let url = format!("{base}/stats");
        posts.push(tokio::spawn(async move {
            let payload = RelayPayload::new(
                "cars",
                i % 3,
                Some(format!("Key-{}", i % 4 + 1).as_bytes()),
                Event::new("Mike", "BMW", "Blue"),
            );
            client.post(url).json(&payload).send().await
        }));
    }
    for post in posts {
        assert_eq!(post.await??.status(), reqwest::StatusCode::OK);
    }

    let snapshot: serde_json::Value = client.get(&base).send().await?.json().await?;
    assert_eq!(snapshot["total"], 40);
    assert_eq!(snapshot["total_partition"]["0"], 14);
    assert_eq!(snapshot["total_partition"]["1"], 13);
    assert_eq!(snapshot["total_partition"]["2"], 13);
    assert_eq!(snapshot["last_message"]["car"], "BMW");

    let rejected = client
        .post(format!("{base}/stats"))
        .body("{}")
        .send()
        .await?;
    assert_eq!(rejected.status(), reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(aggregator.snapshot().await.total, 40);

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), server).await???;

    assert!(client.get(&base).send().await.is_err());
    Ok(())
}
