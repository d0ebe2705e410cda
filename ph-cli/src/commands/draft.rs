//! Story draft commands.

use clap::Subcommand;
use console::style;

use ph_core::config::ConfigHandle;
use ph_core::error::PhResult;
use ph_models::StoryDraft;
use ph_services::DraftService;

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum DraftAction {
    /// Show the saved draft.
    Show,
    /// Save (or overwrite) the draft.
    Save {
        #[arg(long, default_value = "")]
        author: String,
        #[arg(long, default_value = "")]
        kindergarten: String,
        #[arg(long, default_value = "")]
        year: String,
        #[arg(long, default_value = "")]
        role: String,
        #[arg(long, default_value = "")]
        text: String,
    },
    /// Discard the saved draft.
    Clear,
}

pub async fn run(config: ConfigHandle, action: DraftAction, format: OutputFormat) -> PhResult<()> {
    let store = super::open_store(&config).await?;
    let drafts = DraftService::new(store);

    match action {
        DraftAction::Show => {
            let draft = drafts.load()?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::json!({ "draft": draft })),
                OutputFormat::Text => match draft {
                    Some(draft) => print_draft(&draft),
                    None => println!("  No saved draft."),
                },
            }
        }
        DraftAction::Save {
            author,
            kindergarten,
            year,
            role,
            text,
        } => {
            drafts.save(StoryDraft {
                author,
                kindergarten,
                year,
                role,
                text,
                saved_at: None,
            })?;
            println!("  {} Draft saved.", style("OK").green().bold());
        }
        DraftAction::Clear => {
            drafts.clear()?;
            println!("  {} Draft cleared.", style("OK").green().bold());
        }
    }

    Ok(())
}

pub fn print_draft(draft: &StoryDraft) {
    let field = |value: &str| {
        if value.is_empty() {
            style("-".to_string()).dim().to_string()
        } else {
            value.to_string()
        }
    };
    println!("  Author:        {}", field(&draft.author));
    println!("  Kindergarten:  {}", field(&draft.kindergarten));
    println!("  Year:          {}", field(&draft.year));
    println!("  Role:          {}", field(&draft.role));
    println!("  Text:          {}", field(&super::truncate(&draft.text, 60)));
    if let Some(saved_at) = draft.saved_at {
        println!("  Saved:         {}", saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
}
