//! Command-line interface for vehicle-stats
//!
//! # Usage Examples
//!
//! ## Statistics server
//! ```bash
//! vehicle-stats serve --listen-address 0.0.0.0:8080
//! curl localhost:8080/
//! ```
//!
//! ## Subscriber
//! ```bash
//! BOOTSTRAP_SERVERS=localhost:9092 TOPIC=cars OUT_ADDRESS=localhost:8080 \
//!   SCHEMA_REGISTRY_URL=http://localhost:8081 \
//!   vehicle-stats consume --num-consumers 3
//! ```
//!
//! ## Producer
//! ```bash
//! KAFKA_URL=localhost:9092 TOPIC=cars vehicle-stats produce \
//!   --interval 250ms --create-topic --partitions 3
//! ```
//!
//! ## TLS
//! The `--ssl-ca-location`, `--ssl-certificate-location` and
//! `--ssl-key-location` options switch the brokers to `security.protocol=ssl`
//! and are also used for an `https://` schema registry. Build with the `ssl`
//! feature for TLS support in librdkafka.

use clap::{Parser, Subcommand};
use std::time::Duration;
use vehicle_stats::config::{parse_duration, LogFormat};
use vehicle_stats::{consume, logging, produce, serve, Lifecycle};
use vehicle_stats::{ConsumeArgs, ProduceArgs, ServeArgs};

#[derive(Parser)]
#[command(name = "vehicle-stats")]
#[command(about = "Publish, relay and aggregate vehicle purchase events")]
#[command(long_about = None)]
struct Cli {
    /// Log output format
    #[arg(long, global = true, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Time allowed for in-flight work after a termination signal
    #[arg(
        long,
        global = true,
        env = "SHUTDOWN_GRACE",
        default_value = "1s",
        value_parser = parse_duration
    )]
    shutdown_grace: Duration,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate events and publish them to a topic
    Produce(ProduceArgs),

    /// Relay events from a topic to the stats server
    Consume(ConsumeArgs),

    /// Run the stats server
    Serve(ServeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    logging::init(cli.log_format);

    let lifecycle = Lifecycle::new(cli.shutdown_grace);
    let signals = lifecycle.listen_for_signals();

    let result = match cli.command {
        Commands::Produce(args) => produce::run(args, &lifecycle).await,
        Commands::Consume(args) => consume::run(args, &lifecycle).await,
        Commands::Serve(args) => serve::run(args, &lifecycle).await,
    };

    signals.abort();
    result
}
