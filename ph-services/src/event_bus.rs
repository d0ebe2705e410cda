//! Typed event bus for intra-service communication.
//!
//! Uses tokio broadcast channels to decouple services from one another.
//! The loader, queue, replay and submission paths emit events without
//! knowing who listens (the CLI watcher, tests, a future UI layer).

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use ph_models::StoryStatus;

/// Where a content load was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Network,
    LocalStore,
}

impl std::fmt::Display for LoadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::LocalStore => write!(f, "local store"),
        }
    }
}

/// Record counts for the three collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentCounts {
    pub timeline: usize,
    pub stories: usize,
    pub benefits: usize,
}

impl std::fmt::Display for ContentCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} timeline events, {} stories, {} benefits",
            self.timeline, self.stories, self.benefits
        )
    }
}

/// Application-level events.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The connectivity signal flipped.
    ConnectivityChanged { online: bool },
    /// Content is in memory and ready to display.
    ContentLoaded {
        source: LoadSource,
        counts: ContentCounts,
    },
    /// Fetched content was written to the local store.
    MirrorCompleted { counts: ContentCounts },
    /// Writing fetched content to the local store failed.
    MirrorFailed { error: String },
    /// A story was accepted by the submission entry point.
    StorySubmitted {
        story_id: String,
        status: StoryStatus,
    },
    /// A story was added to the pending queue.
    StoryQueued { story_id: String, queue_len: usize },
    /// A queued story was delivered and is now published.
    StoryPublished { story_id: String },
    /// A replay pass began.
    ReplayStarted { pending: usize },
    /// A replay pass drained the queue.
    ReplayFinished { delivered: usize, remaining: usize },
    /// A replay pass stopped at a delivery failure.
    ReplayStopped {
        story_id: String,
        error: String,
        remaining: usize,
    },
    /// A background sync tag was registered.
    BackgroundSyncRequested { tag: String },
}

/// Application-wide event bus backed by a tokio broadcast channel.
///
/// Every subscriber gets every event. Slow subscribers that fall behind
/// receive a `Lagged` error and miss events.
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<AppEvent>>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribe to receive application events.
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: AppEvent) {
        let label = event_label(&event);
        match self.sender.send(event) {
            Ok(count) => debug!("event_bus: emitted {label} to {count} subscriber(s)"),
            Err(_) => debug!("event_bus: no subscribers for {label}"),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Human-readable label for an event (for logging).
pub fn event_label(event: &AppEvent) -> &'static str {
    match event {
        AppEvent::ConnectivityChanged { .. } => "ConnectivityChanged",
        AppEvent::ContentLoaded { .. } => "ContentLoaded",
        AppEvent::MirrorCompleted { .. } => "MirrorCompleted",
        AppEvent::MirrorFailed { .. } => "MirrorFailed",
        AppEvent::StorySubmitted { .. } => "StorySubmitted",
        AppEvent::StoryQueued { .. } => "StoryQueued",
        AppEvent::StoryPublished { .. } => "StoryPublished",
        AppEvent::ReplayStarted { .. } => "ReplayStarted",
        AppEvent::ReplayFinished { .. } => "ReplayFinished",
        AppEvent::ReplayStopped { .. } => "ReplayStopped",
        AppEvent::BackgroundSyncRequested { .. } => "BackgroundSyncRequested",
    }
}
