//! Story submission command.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use clap::Args;
use console::style;

use ph_core::config::ConfigHandle;
use ph_core::error::{PhError, PhResult};
use ph_services::{StoryForm, SubmissionOutcome};

use crate::OutputFormat;

#[derive(Args)]
pub struct SubmitArgs {
    /// Your name.
    #[arg(long)]
    author: String,
    /// Kindergarten the story is about.
    #[arg(long)]
    kindergarten: String,
    /// Story text.
    #[arg(long)]
    text: String,
    /// Year the story took place.
    #[arg(long)]
    year: Option<String>,
    /// Your role (parent, teacher, pupil, ...).
    #[arg(long, default_value = "")]
    role: String,
    /// Contact email (not published).
    #[arg(long)]
    email: Option<String>,
    /// Photo to attach (jpeg, png, gif or webp).
    #[arg(long)]
    photo: Option<PathBuf>,
    /// Consent to publishing the story.
    #[arg(long)]
    consent: bool,
    /// Treat the site as unreachable and queue the story.
    #[arg(long)]
    offline: bool,
}

pub async fn run(config: ConfigHandle, args: SubmitArgs, format: OutputFormat) -> PhResult<()> {
    let photo = match &args.photo {
        Some(path) => Some(photo_data_uri(path)?),
        None => None,
    };
    let form = StoryForm {
        author: args.author,
        email: args.email,
        kindergarten: args.kindergarten,
        year: args.year,
        role: args.role,
        text: args.text,
        photo,
        privacy: args.consent,
    };

    let mut session = super::start_app(&config, args.offline).await?;
    let result = session.app.submit(form).await;
    session.app.shutdown().await;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(PhError::Validation(issues)) => {
            if let OutputFormat::Text = format {
                println!("  {} The story was not submitted:", style("INVALID").red().bold());
                for issue in &issues {
                    println!("    - {issue}");
                }
            }
            return Err(PhError::Validation(issues));
        }
        Err(e) => return Err(e),
    };

    let story = outcome.story();
    match format {
        OutputFormat::Json => {
            let queue_len = match &outcome {
                SubmissionOutcome::Queued { queue_len, .. } => Some(*queue_len),
                SubmissionOutcome::Published(_) => None,
            };
            println!(
                "{}",
                serde_json::json!({
                    "id": story.id.to_string(),
                    "status": story.status.as_str(),
                    "queue_len": queue_len,
                })
            );
        }
        OutputFormat::Text => match &outcome {
            SubmissionOutcome::Published(_) => {
                println!(
                    "  {} Story {} published. Thank you!",
                    style("OK").green().bold(),
                    story.id
                );
            }
            SubmissionOutcome::Queued { queue_len, .. } => {
                println!(
                    "  {} Story {} saved and will be sent when the site is reachable ({} queued).",
                    style("QUEUED").yellow().bold(),
                    story.id,
                    queue_len
                );
            }
        },
    }
    Ok(())
}

/// Read an image file into a `data:` URI.
fn photo_data_uri(path: &Path) -> PhResult<String> {
    let mime = image_mime(path).ok_or_else(|| {
        PhError::Validation(vec![format!(
            "photo must be a jpeg, png, gif or webp image: {}",
            path.display()
        )])
    })?;
    let bytes = std::fs::read(path)?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{mime};base64,{encoded}"))
}

fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
