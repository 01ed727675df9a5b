//! Config commands.

use std::path::Path;

use clap::Subcommand;
use console::style;

use sc_core::config::{AppConfig, ConfigHandle};
use sc_core::error::{ScError, ScResult};

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration (secrets masked).
    Show,
    /// Write a default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file path.
    Path,
}

/// Copy of the config that is safe to print.
fn masked(cfg: &AppConfig) -> AppConfig {
    let mut cfg = cfg.clone();
    cfg.connection.token = super::redact(&cfg.connection.token);
    cfg
}

/// Run a config subcommand.
pub async fn run(
    config: ConfigHandle,
    action: ConfigAction,
    path: &Path,
    format: OutputFormat,
) -> ScResult<()> {
    match action {
        ConfigAction::Show => {
            let cfg = masked(&*config.read().await);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&cfg)?),
                OutputFormat::Text => {
                    let text = toml::to_string_pretty(&cfg)
                        .map_err(|e| ScError::Serialization(e.to_string()))?;
                    println!("{}", style(format!("# {}", path.display())).dim());
                    println!("{text}");
                }
            }
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                println!(
                    "  {} {} already exists (use --force to overwrite)",
                    style("SKIP").yellow(),
                    path.display()
                );
                return Ok(());
            }
            AppConfig::default().save_to_file(path)?;
            println!("  {} Wrote {}", style("OK").green(), path.display());
        }
        ConfigAction::Path => println!("{}", path.display()),
    }
    Ok(())
}
