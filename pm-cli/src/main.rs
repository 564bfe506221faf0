//! Property Manager CLI.
//!
//! Runs the HTTP server, opens an interactive tenant-assistant chat, and
//! manages the local database from the terminal.

mod commands;

use clap::{Parser, Subcommand};
use tracing::info;

use pm_core::config::{AppConfig, ConfigHandle};
use pm_core::error::PmResult;
use pm_core::logging;

/// Property Manager - landlords, tenants, properties, contractors and issues.
#[derive(Parser)]
#[command(
    name = "propman",
    version,
    about = "Property management backend and tenant assistant",
    long_about = "Serve the property management HTTP API, chat with the tenant assistant\n\
                  backed by a local Ollama model, and manage the SQLite database."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json).
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for scripting.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server.
    Serve {
        /// Interface to bind (overrides config).
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides config).
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Chat with the tenant assistant (type exit or quit to leave).
    Chat {
        /// Print the reply as it is generated.
        #[arg(long)]
        stream: bool,
    },
    /// Show model reachability and local database counts.
    Status,
    /// Database management commands.
    Db {
        #[command(subcommand)]
        action: commands::db::DbAction,
    },
    /// List and resolve maintenance issues.
    Issues {
        #[command(subcommand)]
        action: commands::issues::IssuesAction,
    },
}

#[tokio::main]
async fn main() -> PmResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::load_from_file(std::path::Path::new(path))?,
        None => AppConfig::load_default()?,
    };

    // Initialize logging
    let log_level = if cli.verbose { "debug".to_string() } else { config.logging.level.clone() };
    let log_dir = config.effective_log_dir()?;
    let _guard = logging::init_logging(&log_level, &log_dir, config.logging.json_output)?;

    let config_handle = ConfigHandle::new(config);

    info!("{} CLI v{}", pm_core::constants::APP_NAME, pm_core::constants::APP_VERSION);

    // Dispatch to command handlers
    match cli.command {
        Commands::Serve { host, port } => {
            commands::serve::run(config_handle, host, port).await
        }
        Commands::Chat { stream } => {
            commands::chat::run(config_handle, stream).await
        }
        Commands::Status => {
            commands::status::run(config_handle, cli.format).await
        }
        Commands::Db { action } => {
            commands::db::run(config_handle, action, cli.format).await
        }
        Commands::Issues { action } => {
            commands::issues::run(config_handle, action, cli.format).await
        }
    }
}
