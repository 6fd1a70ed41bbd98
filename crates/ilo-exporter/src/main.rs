//! Main binary for the iLO exporter

mod config;
mod handler;
mod server;

use clap::Parser;
use config::ExporterConfig;
use ilo_core::TargetFallback;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "ilo-exporter")]
#[command(about = "On-demand Prometheus exporter for HP iLO controller health")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Listen address
    #[arg(long, value_name = "ADDR", default_value = "0.0.0.0")]
    address: String,

    /// Listen port
    #[arg(long, value_name = "PORT", default_value_t = 9416)]
    port: u16,

    /// Path that serves the metrics payload
    #[arg(long, value_name = "PATH", default_value = "/metrics")]
    endpoint: String,

    /// Maximum number of concurrently handled requests
    #[arg(long, value_name = "N", default_value_t = 30)]
    max_connections: usize,

    /// Per-request timeout ceiling in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    request_timeout: u64,

    /// Log level
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = ExporterConfig {
        address: cli.address,
        port: cli.port,
        endpoint: cli.endpoint,
        max_connections: cli.max_connections,
        request_timeout: Duration::from_secs(cli.request_timeout),
    };

    // Fallback credentials are read once; requests without their own
    // target parameters overlay onto these.
    let fallback = TargetFallback::from_env();

    server::run(config, fallback).await
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
