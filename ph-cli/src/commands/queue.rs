//! Pending-submission queue commands.

use clap::Subcommand;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use console::style;
use dialoguer::Confirm;

use ph_core::config::ConfigHandle;
use ph_core::error::PhResult;
use ph_services::PendingQueue;

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum QueueAction {
    /// List queued stories in replay order.
    List,
    /// Drop every queued story without sending it.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn run(config: ConfigHandle, action: QueueAction, format: OutputFormat) -> PhResult<()> {
    let store = super::open_store(&config).await?;
    let queue = PendingQueue::new(store);

    match action {
        QueueAction::List => {
            let stories = queue.snapshot().await;
            match format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::json!({
                            "durable": queue.is_durable(),
                            "count": stories.len(),
                            "stories": stories,
                        })
                    );
                }
                OutputFormat::Text => {
                    if stories.is_empty() {
                        println!("  Queue is empty.");
                        return Ok(());
                    }

                    let mut table = Table::new();
                    table
                        .load_preset(UTF8_FULL)
                        .apply_modifier(UTF8_ROUND_CORNERS)
                        .set_content_arrangement(ContentArrangement::Dynamic);
                    table.set_header(vec!["#", "ID", "Status", "Author", "Story"]);
                    for (i, story) in stories.iter().enumerate() {
                        table.add_row(vec![
                            (i + 1).to_string(),
                            story.id.to_string(),
                            story.status.to_string(),
                            story.author.clone(),
                            story.excerpt(40),
                        ]);
                    }
                    println!("{table}");
                    if !queue.is_durable() {
                        println!(
                            "  {} Local storage is unavailable; this queue will not survive a restart.",
                            style("WARN").yellow().bold()
                        );
                    }
                }
            }
        }
        QueueAction::Clear { yes } => {
            let pending = queue.len().await;
            if pending == 0 {
                println!("  Queue is already empty.");
                return Ok(());
            }

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("  Discard {pending} unsent stor{}?", if pending == 1 { "y" } else { "ies" }))
                    .default(false)
                    .interact()
                    .unwrap_or(false);
                if !confirmed {
                    println!("  Clear cancelled.");
                    return Ok(());
                }
            }

            let removed = queue.clear().await;
            match format {
                OutputFormat::Json => println!("{}", serde_json::json!({ "removed": removed })),
                OutputFormat::Text => println!(
                    "  {} Removed {} queued stor{}.",
                    style("OK").green().bold(),
                    removed,
                    if removed == 1 { "y" } else { "ies" }
                ),
            }
        }
    }

    Ok(())
}
