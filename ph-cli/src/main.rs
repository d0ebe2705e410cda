//! Preschool History CLI - drive the offline content and story subsystem
//! from the terminal.
//!
//! Useful for seeding and inspecting the local store, submitting stories
//! while offline, and watching the queue drain when the site comes back.

mod commands;

use clap::{Parser, Subcommand};
use tracing::info;

use ph_core::config::{AppConfig, ConfigHandle};
use ph_core::error::PhResult;
use ph_core::logging;
use ph_core::platform::Platform;

/// Preschool History - offline history content and story sync.
#[derive(Parser)]
#[command(
    name = "preschool-history",
    version,
    about = "Preschool History offline content and story sync",
    long_about = "Load the preschool history timeline, stories and benefits into a local store,\n\
                  submit memories offline, and replay them when the site is reachable again."
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
    /// Load all content (network first, local store as fallback).
    Load,
    /// Show the history timeline.
    Timeline,
    /// Show the stories, newest first.
    Stories {
        /// Maximum number of stories to show.
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Show the benefits list.
    Benefits,
    /// Render a page by its slug (index, history, stories, add-story, benefits, about).
    Page {
        slug: String,
    },
    /// Submit a story.
    Submit(commands::submit::SubmitArgs),
    /// Inspect the pending-submission queue.
    Queue {
        #[command(subcommand)]
        action: commands::queue::QueueAction,
    },
    /// Replay queued stories now.
    Sync,
    /// Probe connectivity, replay on reconnect and run background sync until Ctrl-C.
    Watch,
    /// Manage the saved story draft.
    Draft {
        #[command(subcommand)]
        action: commands::draft::DraftAction,
    },
    /// Local store management commands.
    Db {
        #[command(subcommand)]
        action: commands::db::DbAction,
    },
    /// Show or create the configuration file.
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main]
async fn main() -> PhResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_deref().map(std::path::Path::new);
    let config = match config_path {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_default()?,
    };

    // Initialize logging
    let log_dir = config
        .effective_log_dir()
        .unwrap_or_else(|_| std::path::PathBuf::from("logs"));
    let _guard = logging::init_logging(&config.logging, &log_dir, cli.verbose)?;

    let config_handle = ConfigHandle::new(config);

    info!(
        "Preschool History CLI v{} ({})",
        ph_core::constants::APP_VERSION,
        Platform::current()
    );

    // Dispatch to command handlers
    match cli.command {
        Commands::Load => commands::content::load(config_handle, cli.format).await,
        Commands::Timeline => commands::content::timeline(config_handle, cli.format).await,
        Commands::Stories { limit } => {
            commands::content::stories(config_handle, limit, cli.format).await
        }
        Commands::Benefits => commands::content::benefits(config_handle, cli.format).await,
        Commands::Page { slug } => commands::content::page(config_handle, &slug, cli.format).await,
        Commands::Submit(args) => commands::submit::run(config_handle, args, cli.format).await,
        Commands::Queue { action } => {
            commands::queue::run(config_handle, action, cli.format).await
        }
        Commands::Sync => commands::sync::sync(config_handle, cli.format).await,
        Commands::Watch => commands::sync::watch(config_handle, cli.format).await,
        Commands::Draft { action } => {
            commands::draft::run(config_handle, action, cli.format).await
        }
        Commands::Db { action } => commands::db::run(config_handle, action, cli.format).await,
        Commands::Config { action } => {
            commands::config::run(config_handle, config_path, action, cli.format).await
        }
    }
}
