//! campusbot CLI, the main entry point.
//!
//! Commands:
//! - `serve`    Start the HTTP server
//! - `doctor`   Diagnose configuration, data, and upstream reachability
//! - `catalog`  Print the catalog brief the prompt would carry

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "campusbot",
    about = "campusbot: admissions chat relay with a local knowledge base",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (defaults to ./campusbot.toml)
    #[arg(short, long, global = true, env = "CAMPUSBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the bind address
        #[arg(long)]
        host: Option<String>,
    },

    /// Diagnose configuration, data files, and upstream reachability
    Doctor,

    /// Load the knowledge base once and print the catalog brief
    Catalog {
        /// Programs to list (defaults to the configured brief limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve { port, host } => commands::serve::run(config_path, port, host).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
        Commands::Catalog { limit } => commands::catalog::run(config_path, limit).await?,
    }

    Ok(())
}
