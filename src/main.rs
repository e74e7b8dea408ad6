//! Speedtest Exporter - Prometheus exporter for the Ookla speedtest CLI
//!
//! # Usage
//! ```sh
//! SPEEDTEST_CACHE_FOR=300 SPEEDTEST_SERVER=1234,5678 speedtest-exporter
//! ```
//!
//! # Environment Variables
//! - `SPEEDTEST_PORT` - Listen port (default: 9798)
//! - `SPEEDTEST_CACHE_FOR` - Seconds to reuse a measurement (default: 0)
//! - `SPEEDTEST_TIMEOUT` - Seconds before a run is killed (default: 90)
//! - `SPEEDTEST_SERVER` - Comma separated server ids (default: automatic)

use anyhow::{Context, Result};
use clap::Parser;
use speedtest_exporter::application::exporter::Exporter;
use speedtest_exporter::config::Config;
use speedtest_exporter::infrastructure::SpeedtestCli;
use speedtest_exporter::infrastructure::binary_check::{
    EXIT_BINARY_UNAVAILABLE, check_binary, remediation,
};
use speedtest_exporter::interfaces::http;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Prometheus exporter for the Ookla speedtest CLI", long_about = None)]
struct Cli {
    /// Listen port, overrides SPEEDTEST_PORT
    #[arg(short, long)]
    port: Option<u16>,

    /// Listen address, overrides SPEEDTEST_BIND_ADDRESS
    #[arg(long)]
    bind: Option<String>,

    /// Only verify the speedtest CLI installation and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let mut config = Config::from_env()?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    let binary = match check_binary(&config.speedtest.binary).await {
        Ok(path) => path,
        Err(e) => {
            error!("{}", e);
            error!("{}", remediation(&e));
            std::process::exit(EXIT_BINARY_UNAVAILABLE);
        }
    };
    if cli.check {
        info!("Speedtest CLI check passed.");
        return Ok(());
    }

    let runner = Arc::new(SpeedtestCli::new(binary));
    let exporter = Arc::new(Exporter::build(&config.speedtest, runner)?);
    let app = http::router(exporter);

    let addr = config.server.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(
        "Starting Speedtest-Exporter {} on http://localhost:{}",
        env!("CARGO_PKG_VERSION"),
        config.server.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received. Exiting...");
            }
        })
        .await?;

    Ok(())
}
