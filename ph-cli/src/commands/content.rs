//! Content commands: load, list collections, render pages.

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use ph_core::config::ConfigHandle;
use ph_core::error::{PhError, PhResult};
use ph_models::{Benefit, Story, TimelineEvent};
use ph_services::loader::LoadReport;
use ph_services::{LoadSource, Page, PageView};

use crate::OutputFormat;

pub async fn load(config: ConfigHandle, format: OutputFormat) -> PhResult<()> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Loading content...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let mut session = super::start_app(&config, false).await?;
    pb.finish_and_clear();

    let report = session.app.last_load().cloned();
    let mirrored = session.app.loader().wait_for_mirror().await;
    session.app.shutdown().await;

    let Some(report) = report else {
        return Err(PhError::ServiceNotInitialized("content was not loaded".into()));
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "source": source_label(report.source),
                    "timeline": report.counts.timeline,
                    "stories": report.counts.stories,
                    "benefits": report.counts.benefits,
                    "network_error": report.network_error,
                    "mirrored": matches!(mirrored, Ok(Some(_))),
                })
            );
        }
        OutputFormat::Text => {
            print_load_report(&report);
            match mirrored {
                Ok(Some(_)) => println!(
                    "  {} Content saved for offline use.",
                    style("OK").green().bold()
                ),
                Ok(None) => {}
                Err(e) => println!(
                    "  {} Could not save content locally: {}",
                    style("WARN").yellow().bold(),
                    e
                ),
            }
        }
    }
    Ok(())
}

pub async fn timeline(config: ConfigHandle, format: OutputFormat) -> PhResult<()> {
    page_with(config, Page::History, format, None).await
}

pub async fn stories(config: ConfigHandle, limit: usize, format: OutputFormat) -> PhResult<()> {
    page_with(config, Page::Stories, format, Some(limit)).await
}

pub async fn benefits(config: ConfigHandle, format: OutputFormat) -> PhResult<()> {
    page_with(config, Page::Benefits, format, None).await
}

pub async fn page(config: ConfigHandle, slug: &str, format: OutputFormat) -> PhResult<()> {
    let page = Page::from_slug(slug).ok_or_else(|| {
        let known: Vec<&str> = Page::ALL.iter().map(|p| p.slug()).collect();
        PhError::NotFound(format!("page '{slug}' (known: {})", known.join(", ")))
    })?;
    page_with(config, page, format, None).await
}

async fn page_with(
    config: ConfigHandle,
    page: Page,
    format: OutputFormat,
    limit: Option<usize>,
) -> PhResult<()> {
    let mut session = super::start_app(&config, false).await?;
    let view = session.app.view(page).await;
    session.app.shutdown().await;
    let view = view?;

    match format {
        OutputFormat::Json => println!("{}", view_json(&view, limit)),
        OutputFormat::Text => print_view(&view, limit),
    }
    Ok(())
}

fn source_label(source: LoadSource) -> &'static str {
    match source {
        LoadSource::Network => "network",
        LoadSource::LocalStore => "local_store",
    }
}

fn print_load_report(report: &LoadReport) {
    match report.source {
        LoadSource::Network => println!(
            "  {} Loaded from the network.",
            style("OK").green().bold()
        ),
        LoadSource::LocalStore => println!(
            "  {} Offline, showing saved content ({}).",
            style("OFFLINE").yellow().bold(),
            report.network_error.as_deref().unwrap_or("unreachable")
        ),
    }
    println!("    Timeline:  {}", report.counts.timeline);
    println!("    Stories:   {}", report.counts.stories);
    println!("    Benefits:  {}", report.counts.benefits);
}

fn view_json(view: &PageView, limit: Option<usize>) -> serde_json::Value {
    let page = view.page().slug();
    match view {
        PageView::Home {
            first_visit,
            counts,
            pending,
        } => serde_json::json!({
            "page": page,
            "first_visit": first_visit,
            "timeline": counts.timeline,
            "stories": counts.stories,
            "benefits": counts.benefits,
            "pending": pending,
        }),
        PageView::History { timeline } => serde_json::json!({ "page": page, "timeline": timeline }),
        PageView::Stories { stories } => {
            let shown: Vec<&Story> = stories.iter().take(limit.unwrap_or(usize::MAX)).collect();
            serde_json::json!({ "page": page, "total": stories.len(), "stories": shown })
        }
        PageView::AddStory { draft, pending } => {
            serde_json::json!({ "page": page, "draft": draft, "pending": pending })
        }
        PageView::Benefits { benefits } => serde_json::json!({ "page": page, "benefits": benefits }),
        PageView::About => serde_json::json!({ "page": page }),
    }
}

fn print_view(view: &PageView, limit: Option<usize>) {
    match view {
        PageView::Home {
            first_visit,
            counts,
            pending,
        } => {
            println!("{}", style(ph_core::constants::APP_NAME).bold().underlined());
            if *first_visit {
                println!("  Welcome! This is your first visit.");
            }
            println!("  {counts}");
            if *pending > 0 {
                println!(
                    "  {} {} stor{} waiting to be sent.",
                    style("QUEUED").yellow().bold(),
                    pending,
                    if *pending == 1 { "y" } else { "ies" }
                );
            }
        }
        PageView::History { timeline } => print_timeline(timeline),
        PageView::Stories { stories } => print_stories(stories, limit.unwrap_or(usize::MAX)),
        PageView::AddStory { draft, pending } => {
            println!("{}", style("Share your story").bold().underlined());
            match draft {
                Some(draft) => super::draft::print_draft(draft),
                None => println!("  No saved draft."),
            }
            println!("  Pending submissions: {pending}");
        }
        PageView::Benefits { benefits } => print_benefits(benefits),
        PageView::About => {
            println!("{}", style("About").bold().underlined());
            println!(
                "  {} v{}: the history of preschool education, with memories from its people.",
                ph_core::constants::APP_NAME,
                ph_core::constants::APP_VERSION
            );
        }
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn print_timeline(timeline: &[TimelineEvent]) {
    if timeline.is_empty() {
        println!("  No timeline events.");
        return;
    }

    let mut table = new_table();
    table.set_header(vec!["Year", "Title", "Description"]);
    for event in timeline {
        table.add_row(vec![
            event.year.to_string(),
            event.title.clone(),
            super::truncate(&event.description, 60),
        ]);
    }
    println!("{table}");
}

fn print_stories(stories: &[Story], limit: usize) {
    if stories.is_empty() {
        println!("  No stories yet.");
        return;
    }

    let mut table = new_table();
    table.set_header(vec!["Date", "Author", "Kindergarten", "Year", "Story"]);
    for story in stories.iter().take(limit) {
        let date = story
            .timestamp()
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| story.date.clone());
        table.add_row(vec![
            date,
            story.author.clone(),
            story.kindergarten.clone(),
            story.year.map(|y| y.to_string()).unwrap_or_default(),
            match story.title() {
                Some(title) => super::truncate(title, 50),
                None => story.excerpt(50),
            },
        ]);
    }
    println!("{table}");
    if stories.len() > limit {
        println!("  ... and {} more", stories.len() - limit);
    }
}

fn print_benefits(benefits: &[Benefit]) {
    if benefits.is_empty() {
        println!("  No benefits listed.");
        return;
    }

    let mut table = new_table();
    table.set_header(vec!["Benefit", "Description"]);
    for benefit in benefits {
        table.add_row(vec![
            benefit.title.clone().unwrap_or_else(|| benefit.id.to_string()),
            super::truncate(benefit.description.as_deref().unwrap_or(""), 70),
        ]);
    }
    println!("{table}");
}
