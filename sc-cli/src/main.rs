//! Stream Chat CLI - watch a chat socket connection from the terminal.
//!
//! Opens the persistent socket connection with the configured endpoint and
//! credentials and prints state changes and incoming events. Useful for
//! debugging connection handling and for scripting against the event stream.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use sc_core::config::{AppConfig, ConfigHandle};
use sc_core::error::ScResult;
use sc_core::logging;
use sc_core::platform::Platform;

/// Stream Chat socket client.
#[derive(Parser)]
#[command(
    name = "sc-chat",
    version,
    about = "Stream Chat socket client CLI",
    long_about = "A command-line client for the Stream Chat real-time socket.\n\
                  Connects anonymously or as a user and prints connection state and events."
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
    /// One JSON object per line.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the chat socket and print events until Ctrl+C.
    Connect {
        /// WebSocket endpoint (overrides config).
        #[arg(short, long)]
        endpoint: Option<String>,
        /// API key (overrides config).
        #[arg(short = 'k', long)]
        api_key: Option<String>,
        /// User id; omit for an anonymous connection (overrides config).
        #[arg(short, long)]
        user: Option<String>,
        /// Display name sent with the user details.
        #[arg(short, long)]
        name: Option<String>,
        /// JWT for the user (overrides config).
        #[arg(short, long)]
        token: Option<String>,
        /// Save connection settings to the config file.
        #[arg(long)]
        save: bool,
    },
    /// Show and manage the configuration file.
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn config_path(cli_path: Option<&str>) -> PathBuf {
    match cli_path {
        Some(path) => PathBuf::from(path),
        None => Platform::config_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("config.toml"),
    }
}

#[tokio::main]
async fn main() -> ScResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let path = config_path(cli.config.as_deref());
    let config = if path.exists() {
        AppConfig::load_from_file(&path)?
    } else {
        AppConfig::default()
    };

    // Initialize logging
    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    // Without a usable log directory, log to the console only.
    let _guard = match config.effective_log_dir() {
        Ok(log_dir) => Some(logging::init_logging(
            &log_level,
            &log_dir,
            config.logging.json_output,
        )?),
        Err(e) => {
            logging::init_console_logging(&log_level);
            warn!("file logging disabled: {e}");
            None
        }
    };

    info!(
        "Stream Chat CLI v{} on {}",
        sc_core::constants::APP_VERSION,
        Platform::current()
    );

    let config_handle = ConfigHandle::new(config);

    match cli.command {
        Commands::Connect {
            endpoint,
            api_key,
            user,
            name,
            token,
            save,
        } => {
            let overrides = commands::connect::Overrides {
                endpoint,
                api_key,
                user,
                name,
                token,
            };
            let save_path = save.then_some(path);
            commands::connect::run(config_handle, overrides, save_path, cli.format).await
        }
        Commands::Config { action } => {
            commands::config::run(config_handle, action, &path, cli.format).await
        }
    }
}
