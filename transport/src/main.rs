//! Transport service binary: TCP CSV-protocol front end, engine thread, and
//! UDP multicast market-data fan-out.

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use clap::Parser;
use transport::{config, server};

/// Multi-symbol matching engine transport service.
#[derive(Parser, Debug)]
#[command(name = "transport", version, about)]
struct Cli {
    /// Path to a JSON configuration file overriding built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let service_config = match config::ServiceConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(err) => {
            tracing::error!(error = %err, "failed to load configuration");
            std::process::exit(1);
        }
    };

    let (addr, shutdown) = match server::bind_and_serve(service_config).await {
        Ok(bound) => bound,
        Err(err) => {
            tracing::error!(error = %err, "failed to start transport service");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "transport service started");

    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
    shutdown.store(true, Ordering::Relaxed);
}
