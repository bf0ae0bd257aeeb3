//! Blockwatch Server
//!
//! Polls Clearsky and serves the dashboard API and WebSocket feed.
//!
//! Run with: cargo run --bin blockwatch -- --config config.toml
//!
//! Environment overrides: `BLOCKWATCH_UPSTREAM_URL`,
//! `BLOCKWATCH_POLL_INTERVAL_SECS`, `BLOCKWATCH_API_HOST`,
//! `BLOCKWATCH_API_PORT`, `BLOCKWATCH_LOG_LEVEL`, `BLOCKWATCH_LOG_FORMAT`,
//! and `RUST_LOG` for the log filter.

use blockwatch::config::Config;
use blockwatch::logging::init_tracing;
use blockwatch::{serve, Service};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blockwatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Clearsky block-count dashboard server")]
struct Args {
    /// Config file (default: search the standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    init_tracing(&config.logging);
    tracing::info!("Starting Blockwatch v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        upstream = %config.upstream.base_url,
        interval_secs = config.poll.interval_secs,
        incumbent = %config.tracking.incumbent.handle,
        challenger = %config.tracking.challenger.handle,
        "Configuration loaded"
    );

    let api_config = config.api.clone();
    let mut service = Service::from_config(config)?;
    service.start();

    serve(service.state().clone(), &api_config).await?;

    service.shutdown();
    tracing::info!("Blockwatch stopped");
    Ok(())
}
