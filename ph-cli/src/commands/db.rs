//! Local store management commands.

use clap::Subcommand;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use console::style;
use dialoguer::Confirm;

use ph_core::config::ConfigHandle;
use ph_core::constants::keys;
use ph_core::error::PhResult;
use ph_models::Collection;

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum DbAction {
    /// Show local store statistics.
    Stats,
    /// Run an integrity check.
    Check,
    /// Reset the local store (WARNING: drops saved content and the pending queue).
    Reset,
    /// Show the database file path.
    Path,
}

pub async fn run(config: ConfigHandle, action: DbAction, format: OutputFormat) -> PhResult<()> {
    let db_path = config.read().await.effective_db_path()?;

    match action {
        DbAction::Stats => {
            let store = super::open_store(&config).await?;
            let db = store.database()?;
            let stats = db.stats()?;
            let pending = store
                .kv_get_json::<Vec<serde_json::Value>>(keys::PENDING_STORIES)?
                .map(|q| q.len())
                .unwrap_or(0);

            let file_size = std::fs::metadata(&db_path).ok().map(|m| m.len());
            let wal_size = std::fs::metadata(db_path.with_extension("db-wal"))
                .ok()
                .map(|m| m.len());

            let conn = db.conn()?;
            let journal_mode: String = conn
                .query_row("PRAGMA journal_mode", [], |row| row.get(0))
                .unwrap_or_else(|_| "unknown".to_string());

            match format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::json!({
                            "path": db_path.display().to_string(),
                            "schema_version": stats.schema_version,
                            "collections": {
                                "timeline": stats.timeline,
                                "stories": stats.stories,
                                "benefits": stats.benefits,
                            },
                            "kv_entries": stats.kv_entries,
                            "pending_stories": pending,
                            "file_size_bytes": file_size,
                            "wal_size_bytes": wal_size,
                            "journal_mode": journal_mode,
                        })
                    );
                }
                OutputFormat::Text => {
                    println!("{}", style("Local Store").bold().underlined());
                    println!("  Path:          {}", db_path.display());
                    println!("  Schema:        v{}", stats.schema_version);
                    println!("  Journal mode:  {}", journal_mode);
                    println!();

                    let mut table = Table::new();
                    table
                        .load_preset(UTF8_FULL)
                        .apply_modifier(UTF8_ROUND_CORNERS)
                        .set_content_arrangement(ContentArrangement::Dynamic);

                    table.set_header(vec!["Collection", "Records"]);
                    for collection in Collection::ALL {
                        table.add_row(vec![
                            collection.to_string(),
                            stats.records(collection).to_string(),
                        ]);
                    }
                    table.add_row(vec!["kv_store".to_string(), stats.kv_entries.to_string()]);
                    println!("{table}");

                    println!("  Pending stories: {pending}");
                    if let Some(size) = file_size {
                        println!("  Database:        {}", super::format_bytes(size));
                    }
                    if let Some(size) = wal_size {
                        println!("  WAL file:        {}", super::format_bytes(size));
                    }
                }
            }
        }
        DbAction::Check => {
            println!("  {} Running integrity check...", style("...").dim());
            let store = super::open_store(&config).await?;
            let db = store.database()?;

            match db.run_integrity_check() {
                Ok(()) => println!(
                    "  {} Integrity check passed.",
                    style("OK").green().bold()
                ),
                Err(e) => println!(
                    "  {} Integrity check failed: {}",
                    style("FAIL").red().bold(),
                    e
                ),
            }
        }
        DbAction::Reset => {
            println!(
                "  {} This will delete saved content, drafts and unsent stories.",
                style("WARNING").red().bold()
            );
            println!("  Database: {}", db_path.display());

            let confirmed = Confirm::new()
                .with_prompt("  Are you sure you want to reset the local store?")
                .default(false)
                .interact()
                .unwrap_or(false);

            if !confirmed {
                println!("  Reset cancelled.");
                return Ok(());
            }

            let store = super::open_store(&config).await?;
            store.database()?.reset()?;
            println!("  {} Local store reset complete.", style("OK").green().bold());
        }
        DbAction::Path => match format {
            OutputFormat::Json => {
                println!("{}", serde_json::json!({ "path": db_path.display().to_string() }));
            }
            OutputFormat::Text => println!("{}", db_path.display()),
        },
    }

    Ok(())
}
