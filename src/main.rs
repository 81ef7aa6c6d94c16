use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mausam::{MausamConfig, logging, web};

#[derive(Debug, Parser)]
#[command(name = "mausam", version, about = "Weather aggregation service")]
struct Cli {
    /// Path to a TOML config file (defaults to ./mausam.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port, overrides the config file
    #[arg(short, long)]
    port: Option<u16>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = MausamConfig::load_from_path(cli.config)?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let _telemetry = logging::init_logging(&config.logging);
    std::panic::set_hook(Box::new(|info| {
        tracing::error!("Uncaught panic: {}", info);
    }));
    tracing::info!("Starting Mausam weather service v{}", mausam::VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let result = runtime.block_on(web::run(config));
    if let Err(e) = &result {
        tracing::error!("Server stopped with error: {:#}", e);
    }
    result
}
