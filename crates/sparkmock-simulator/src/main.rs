//! CLI entry point for the SparkMock edge-node simulator.

use anyhow::Result;
use clap::Parser;
use sparkmock_payload::Encoding;
use sparkmock_simulator::{Catalog, Config, EdgeNode, MqttTransport, PublishStats};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "sparkmock-simulator")]
#[command(about = "Simulates a fleet of edge nodes publishing Sparkplug-B telemetry over MQTT")]
#[command(version)]
struct Cli {
    /// Number of edge nodes to simulate
    #[arg(short, long, default_value = "4")]
    nodes: usize,

    /// Device name appended to the publish topic
    #[arg(short, long, default_value = "device")]
    device: String,

    /// Group namespace used in the publish topic
    #[arg(long, default_value = "MyGroupId")]
    namespace: String,

    /// Percentage of payloads that carry metrics; the rest are events
    #[arg(short, long, default_value = "80")]
    metric_percent: u8,

    /// MQTT broker address as host:port
    #[arg(short, long, default_value = "localhost:1883")]
    server: String,

    /// Publish indented JSON instead of the compact binary encoding
    #[arg(long)]
    readable: bool,

    /// Seconds between publishes per node
    #[arg(short, long, default_value = "10")]
    interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = Config {
        server: cli.server,
        nodes: cli.nodes,
        device: cli.device,
        namespace: cli.namespace,
        metric_percent: cli.metric_percent,
        encoding: if cli.readable {
            Encoding::Readable
        } else {
            Encoding::Compact
        },
        interval: Duration::from_secs(cli.interval_secs),
    };
    config.validate()?;
    let catalog = Arc::new(Catalog::defaults()?);

    info!(
        "starting {} edge nodes against {} ({} encoding, {}% metrics, {:?} interval)",
        config.nodes, config.server, config.encoding, config.metric_percent, config.interval
    );

    let (transport, driver) = MqttTransport::connect(&config).await?;
    let stats = Arc::new(PublishStats::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut workers = Vec::with_capacity(config.nodes);
    for edge_id in 1..=config.nodes {
        let node = EdgeNode::new(
            edge_id,
            &config,
            Arc::clone(&catalog),
            config.encoding,
            transport.clone(),
            Arc::clone(&stats),
            rand::random(),
        );
        workers.push(tokio::spawn(node.run(shutdown_rx.clone())));
    }

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    let _ = shutdown_tx.send(true);
    for worker in workers {
        let _ = worker.await;
    }
    driver.abort();

    info!(
        "published {} metric payloads, {} event payloads ({} bytes); {} encode errors, {} publish errors",
        stats.metric_payloads.load(Ordering::Relaxed),
        stats.event_payloads.load(Ordering::Relaxed),
        stats.bytes_published.load(Ordering::Relaxed),
        stats.encode_errors.load(Ordering::Relaxed),
        stats.publish_errors.load(Ordering::Relaxed),
    );

    Ok(())
}
