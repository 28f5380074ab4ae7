mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use minewright::config::DEFAULT_CONFIG_PATH;

// ============================================================================
// CLI Types
// ============================================================================

/// Minewright - a scripted game-server agent with a supervised session
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the agent (the default when no subcommand is given)
    Serve {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: String,

        /// Game server host (overrides config file and environment)
        #[arg(long)]
        host: Option<String>,

        /// Game server port (overrides config file and environment)
        #[arg(short, long)]
        port: Option<u16>,

        /// Player name (overrides config file and environment)
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Diagnose configuration and environment issues
    Doctor {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: String,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

// ============================================================================
// Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> std::process::ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve {
            config,
            host,
            port,
            username,
        }) => commands::serve::run(&config, host, port, username).await,
        Some(Commands::Doctor { config, format }) => commands::doctor::run(&config, &format).await,
        None => commands::serve::run(DEFAULT_CONFIG_PATH, None, None, None).await,
    }
}

// ============================================================================
// Initialization
// ============================================================================

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
