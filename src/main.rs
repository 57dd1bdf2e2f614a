//! Polled Games - HTTP server binary.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use polled_games::{AppState, ServerConfig};
use std::path::Path;
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    initialize_tracing();

    match cli.command {
        Command::Serve { config, host, port } => run_server(config.as_deref(), host, port).await,
        Command::CheckConfig { config } => check_config(&config),
    }
}

/// Run the HTTP game server
#[instrument(skip_all)]
async fn run_server(
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let config = load_config(config_path)?.with_bind(host, port);

    info!(
        host = %config.host(),
        port = config.port(),
        long_poll_timeout_secs = config.long_poll_timeout_secs(),
        "Starting Polled Games server"
    );
    polled_games::serve(AppState::new(config)?).await
}

/// Print the effective configuration
fn check_config(path: &Path) -> Result<()> {
    let config = load_config(Some(path))?;
    config.validate()?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

#[instrument]
fn load_config(path: Option<&Path>) -> Result<ServerConfig> {
    let config = match path {
        Some(path) => ServerConfig::from_file(path)?,
        None => {
            info!("No config file given, using defaults");
            ServerConfig::default()
        }
    };
    Ok(config.apply_env()?)
}

fn initialize_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,polled_games=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
