//! Command-line interface for polled_games.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Polled Games - two-player tic-tac-toe over HTTP long-polling
#[derive(Parser, Debug)]
#[command(name = "polled_games")]
#[command(about = "Tic-tac-toe server with long-poll turn notification", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to (overrides config and environment)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config and environment)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Load, validate and print the effective configuration
    CheckConfig {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: PathBuf,
    },
}
