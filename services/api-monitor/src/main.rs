//! API Monitor CLI
//!
//! Command-line interface for the multi-target HTTP health monitoring service.

use std::path::PathBuf;

use api_monitor::{load_config, ApiMonitorBuilder, Config};
use clap::Parser;
use tracing::Level;

#[derive(Parser)]
#[command(name = "api-monitor")]
#[command(about = "Multi-target HTTP health monitoring service")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Additional target URL to monitor (repeatable)
    #[arg(short, long = "target")]
    targets: Vec<String>,

    /// Dashboard port (overrides config file)
    #[arg(long)]
    dashboard_port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, targets={:?}, dashboard_port={:?}, log_level={:?}",
        args.config,
        args.targets,
        args.dashboard_port,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    for target in args.targets {
        if !config.targets.contains(&target) {
            config.targets.push(target);
        }
    }

    if let Some(dashboard_port) = args.dashboard_port {
        config.dashboard.port = dashboard_port;
    }

    tracing::info!("Starting API monitor");
    tracing::debug!(
        "Targets: {}, interval: {:?}, timeout: {:?}",
        config.targets.len(),
        config.polling.interval,
        config.polling.timeout
    );

    ApiMonitorBuilder::new(config).build().await?.start().await?;

    Ok(())
}
