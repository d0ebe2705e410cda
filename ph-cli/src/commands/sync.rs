//! Replay and watch commands.

use std::sync::Arc;
use std::time::Duration;

use console::style;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use ph_api::Reachability;
use ph_core::config::ConfigHandle;
use ph_core::error::PhResult;
use ph_services::{AppEvent, ConnectivityProbe, ReplayReport};

use crate::OutputFormat;

/// Replay the pending queue once, now.
pub async fn sync(config: ConfigHandle, format: OutputFormat) -> PhResult<()> {
    let mut session = super::start_app(&config, false).await?;
    let pending = session.app.queue().len().await;
    let report = if pending == 0 {
        Some(ReplayReport::default())
    } else {
        session.app.replay_now().await
    };
    session.app.shutdown().await;

    match format {
        OutputFormat::Json => {
            let report = report.unwrap_or_default();
            println!(
                "{}",
                serde_json::json!({
                    "attempted": report.attempted,
                    "delivered": report.delivered,
                    "remaining": report.remaining,
                    "failed_story": report.failure.as_ref().map(|f| f.story_id.clone()),
                    "error": report.failure.as_ref().map(|f| f.error.clone()),
                })
            );
        }
        OutputFormat::Text => match report {
            None => println!("  Another replay is already running."),
            Some(report) if report.attempted == 0 => println!("  Nothing to send."),
            Some(report) => print_replay(&report),
        },
    }
    Ok(())
}

fn print_replay(report: &ReplayReport) {
    match &report.failure {
        None => println!(
            "  {} Sent {} stor{}.",
            style("OK").green().bold(),
            report.delivered,
            if report.delivered == 1 { "y" } else { "ies" }
        ),
        Some(failure) => {
            println!(
                "  {} Sent {}, stopped at {}: {}",
                style("WARN").yellow().bold(),
                report.delivered,
                failure.story_id,
                failure.error
            );
            println!("  {} stor{} still queued.", report.remaining, if report.remaining == 1 { "y" } else { "ies" });
        }
    }
}

/// Probe connectivity, replay on reconnect and fire background sync until Ctrl-C.
pub async fn watch(config: ConfigHandle, format: OutputFormat) -> PhResult<()> {
    let api = Arc::new(super::create_api_client(&config).await?);
    let probe_interval = Duration::from_secs(config.read().await.sync.probe_interval_secs.max(1));

    let initial = api.is_reachable().await;
    let (probe, signal) = ConnectivityProbe::new(api.clone(), probe_interval, initial);

    let mut app = super::build_app(&config, api, signal).await;
    let mut events = app.event_bus().subscribe();
    app.start_monitor();
    app.start_background_sync();
    let probe_task = probe.spawn();

    if let OutputFormat::Text = format {
        println!(
            "  {} Watching ({}, {} queued). Press Ctrl-C to stop.\n",
            style("WATCH").cyan().bold(),
            if initial { "online" } else { "offline" },
            app.queue().len().await
        );
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(event) => {
                    let reconnected = matches!(event, AppEvent::ConnectivityChanged { online: true });
                    print_event(&event, format);
                    if reconnected {
                        if let Err(e) = app.reload().await {
                            warn!("reload after reconnect failed: {e}");
                        }
                    }
                }
                Err(RecvError::Lagged(missed)) => warn!("watch fell behind, {missed} events missed"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    probe_task.abort();
    app.shutdown().await;
    if let OutputFormat::Text = format {
        println!("\n  Stopped.");
    }
    Ok(())
}

fn print_event(event: &AppEvent, format: OutputFormat) {
    let now = chrono::Local::now().format("%H:%M:%S");

    if let OutputFormat::Json = format {
        println!(
            "{}",
            serde_json::json!({
                "time": now.to_string(),
                "event": ph_services::event_bus::event_label(event),
                "detail": format!("{event:?}"),
            })
        );
        return;
    }

    let line = match event {
        AppEvent::ConnectivityChanged { online: true } => format!("{}", style("online").green()),
        AppEvent::ConnectivityChanged { online: false } => format!("{}", style("offline").yellow()),
        AppEvent::ContentLoaded { source, counts } => format!("content loaded from {source}: {counts}"),
        AppEvent::MirrorCompleted { counts } => format!("saved for offline use: {counts}"),
        AppEvent::MirrorFailed { error } => format!("{} saving content: {error}", style("failed").red()),
        AppEvent::StorySubmitted { story_id, status } => format!("story {story_id} submitted ({status})"),
        AppEvent::StoryQueued { story_id, queue_len } => {
            format!("story {story_id} queued ({queue_len} waiting)")
        }
        AppEvent::StoryPublished { story_id } => {
            format!("story {story_id} {}", style("published").green())
        }
        AppEvent::ReplayStarted { pending } => format!("sending {pending} queued stories"),
        AppEvent::ReplayFinished { delivered, remaining } => {
            format!("replay finished: {delivered} sent, {remaining} left")
        }
        AppEvent::ReplayStopped {
            story_id,
            error,
            remaining,
        } => format!(
            "replay {} at {story_id}: {error} ({remaining} left)",
            style("stopped").red()
        ),
        AppEvent::BackgroundSyncRequested { tag } => format!("background sync '{tag}' registered"),
    };
    println!("  {} {}", style(now).dim(), line);
}
