//! `serve` subcommand: run the statistics server.

use anyhow::Context;
use clap::Args;
use stats_server::{server::bind, Aggregator};
use std::sync::Arc;
use tracing::Instrument;

use crate::lifecycle::Lifecycle;

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "LISTEN_ADDRESS", default_value = "0.0.0.0:8080")]
    pub listen_address: String,
}

/// Serve until shutdown, then drain in-flight requests within the grace period.
pub async fn run(args: ServeArgs, lifecycle: &Lifecycle) -> anyhow::Result<()> {
    let listener = bind(&args.listen_address)
        .await
        .context("Failed to start stats server")?;
    let aggregator = Arc::new(Aggregator::new());

    stats_server::serve(
        listener,
        Arc::clone(&aggregator),
        lifecycle.token(),
        lifecycle.grace(),
    )
    .instrument(tracing::info_span!("stats_server"))
    .await?;

    let snapshot = aggregator.snapshot().await;
    tracing::info!(
        total = snapshot.total,
        partitions = snapshot.per_partition.len(),
        "Final statistics"
    );
    Ok(())
}
