//! Diary gateway entry point.

mod cli;
mod wiring;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use diary_core::{load_env_files, AppConfig};

use crate::cli::Cli;
use crate::wiring::{build_state, StartupError};

#[tokio::main]
async fn main() {
    let loaded = load_env_files();
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    fmt().with_env_filter(filter).with_target(false).init();

    info!(files = ?loaded, "Environment loaded");

    if let Err(e) = run(cli).await {
        error!(error = %e, "Server stopped");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let mut config = AppConfig::from_env()?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let state = build_state(&config)?;
    diary_api::serve(state).await?;
    Ok(())
}
