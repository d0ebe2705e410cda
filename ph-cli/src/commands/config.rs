//! Configuration commands.

use std::path::Path;

use clap::Subcommand;
use console::style;

use ph_core::config::{AppConfig, ConfigHandle};
use ph_core::error::{PhError, PhResult};

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Show the configuration file path.
    Path,
    /// Write the current configuration (defaults plus overrides) to the config file.
    Init {
        /// Content server address to store.
        #[arg(short, long)]
        address: Option<String>,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

pub async fn run(
    config: ConfigHandle,
    config_path: Option<&Path>,
    action: ConfigAction,
    format: OutputFormat,
) -> PhResult<()> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => AppConfig::default_config_path()?,
    };

    match action {
        ConfigAction::Show => {
            let snapshot = config.snapshot().await;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
                OutputFormat::Text => {
                    let text = toml::to_string_pretty(&snapshot)
                        .map_err(|e| PhError::Config(format!("failed to serialize config: {e}")))?;
                    println!("{text}");
                }
            }
        }
        ConfigAction::Path => print_path(&path, path.exists(), format),
        ConfigAction::Init { address, force } => {
            if path.exists() && !force {
                return Err(PhError::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }

            if let Some(address) = address {
                config.write().await.server.address = AppConfig::sanitize_server_address(&address);
            }
            config.snapshot().await.save_to_file(&path)?;
            println!(
                "  {} Configuration written to {}",
                style("OK").green().bold(),
                path.display()
            );
        }
    }

    Ok(())
}

fn print_path(path: &Path, exists: bool, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "path": path.display().to_string(), "exists": exists })
        ),
        OutputFormat::Text => {
            if exists {
                println!("{}", path.display());
            } else {
                println!("{} {}", path.display(), style("(not created yet)").dim());
            }
        }
    }
}
