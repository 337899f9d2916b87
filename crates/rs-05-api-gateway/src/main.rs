//! range-scoreboard: scoring server for attack/defense practice ranges.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use range_telemetry::{init_telemetry, TelemetryConfig};
use rs_05_api_gateway::{ApiGatewayService, GatewayConfig};
use tracing::{info, warn};

/// Range scoreboard server
#[derive(Parser, Debug)]
#[command(name = "range-scoreboard")]
#[command(about = "Collects encrypted agent scores, serves the scoreboard and relays shells")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "range.toml")]
    config: PathBuf,

    /// Override the configured HTTP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut telemetry = TelemetryConfig::from_env();
    if let Some(level) = &args.log_level {
        telemetry = telemetry.with_log_level(level.clone());
    }
    let _guard = init_telemetry(telemetry).context("initializing telemetry")?;

    let mut config = GatewayConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(port) = args.port {
        config.http.port = port;
    }

    info!(config = %args.config.display(), "Starting range scoreboard");
    let service = ApiGatewayService::new(config)?;
    service.serve(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
    }
}
