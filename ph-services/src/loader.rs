//! Content loader: network first, local store as fallback.
//!
//! The three resources are fetched concurrently. If all three arrive and
//! decode, they replace the in-memory state and are mirrored into the local
//! store in the background. If any of them fails the whole network result
//! is dropped and the collections are read back from the store instead. A
//! missing or empty store yields empty collections, never an error.
//!
//! Published stories the server does not know about yet (local submissions,
//! replayed ones) stay in the list on every path. Stories still queued never
//! appear in it.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use ph_api::ContentSource;
use ph_core::error::{PhError, PhResult};
use ph_models::{Benefit, LocalStore, Record, RecordId, Story, StoryStatus, TimelineEvent};

use crate::event_bus::{AppEvent, ContentCounts, EventBus, LoadSource};
use crate::state::SharedState;

/// Outcome of one load.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub source: LoadSource,
    pub counts: ContentCounts,
    /// Why the network path was abandoned, when it was.
    pub network_error: Option<String>,
}

pub struct ContentLoader {
    source: Arc<dyn ContentSource>,
    store: LocalStore,
    state: SharedState,
    event_bus: EventBus,
    mirror_task: Mutex<Option<JoinHandle<PhResult<ContentCounts>>>>,
}

impl ContentLoader {
    pub fn new(
        source: Arc<dyn ContentSource>,
        store: LocalStore,
        state: SharedState,
        event_bus: EventBus,
    ) -> Self {
        Self {
            source,
            store,
            state,
            event_bus,
            mirror_task: Mutex::new(None),
        }
    }

    /// Load all three collections into the shared state.
    pub async fn load(&self) -> LoadReport {
        let fetched = tokio::try_join!(
            self.source.fetch_timeline(),
            self.source.fetch_stories(),
            self.source.fetch_benefits(),
        );

        let report = match fetched {
            Ok((timeline, stories, benefits)) => {
                let local_only = published_local_only(&self.store, &stories);
                let counts = {
                    let mut state = self.state.write().await;
                    state.timeline = timeline.clone();
                    state.stories = stories.clone();
                    for story in local_only {
                        state.upsert_story(story);
                    }
                    state.benefits = benefits.clone();
                    state.source = Some(LoadSource::Network);
                    state.counts()
                };
                info!("loaded content from network: {counts}");
                self.spawn_mirror(timeline, stories, benefits).await;
                LoadReport {
                    source: LoadSource::Network,
                    counts,
                    network_error: None,
                }
            }
            Err(e) => {
                warn!("content fetch failed, falling back to local store: {e}");
                let counts = self.load_from_store().await;
                LoadReport {
                    source: LoadSource::LocalStore,
                    counts,
                    network_error: Some(e.to_string()),
                }
            }
        };

        self.event_bus.emit(AppEvent::ContentLoaded {
            source: report.source,
            counts: report.counts,
        });
        report
    }

    /// Replace the in-memory state with whatever the store holds. Stories
    /// still waiting for delivery stay out of the list.
    pub async fn load_from_store(&self) -> ContentCounts {
        let timeline: Vec<TimelineEvent> = load_or_empty(&self.store);
        let stories: Vec<Story> = load_or_empty::<Story>(&self.store)
            .into_iter()
            .filter(|s| s.status == StoryStatus::Published)
            .collect();
        let benefits: Vec<Benefit> = load_or_empty(&self.store);

        let mut state = self.state.write().await;
        state.timeline = timeline;
        state.stories = stories;
        state.benefits = benefits;
        state.source = Some(LoadSource::LocalStore);
        let counts = state.counts();
        info!("loaded content from local store: {counts}");
        counts
    }

    async fn spawn_mirror(
        &self,
        timeline: Vec<TimelineEvent>,
        stories: Vec<Story>,
        benefits: Vec<Benefit>,
    ) {
        let store = self.store.clone();
        let bus = self.event_bus.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let result = mirror_all(&store, &timeline, &stories, &benefits);
            match &result {
                Ok(counts) => bus.emit(AppEvent::MirrorCompleted { counts: *counts }),
                Err(e) => {
                    warn!("failed to mirror content locally: {e}");
                    bus.emit(AppEvent::MirrorFailed {
                        error: e.to_string(),
                    });
                }
            }
            result
        });

        let mut slot = self.mirror_task.lock().await;
        *slot = Some(handle);
    }

    /// Wait for the most recent background mirror, if one is pending.
    pub async fn wait_for_mirror(&self) -> PhResult<Option<ContentCounts>> {
        let handle = self.mirror_task.lock().await.take();
        match handle {
            Some(handle) => {
                let counts = handle
                    .await
                    .map_err(|e| PhError::Internal(format!("mirror task failed: {e}")))??;
                Ok(Some(counts))
            }
            None => Ok(None),
        }
    }
}

/// Mirror every collection, each in its own transaction. A failing
/// collection does not stop the others; the first error is returned.
fn mirror_all(
    store: &LocalStore,
    timeline: &[TimelineEvent],
    stories: &[Story],
    benefits: &[Benefit],
) -> PhResult<ContentCounts> {
    let timeline = store.mirror(timeline);
    let stories = store.mirror(stories);
    let benefits = store.mirror(benefits);

    Ok(ContentCounts {
        timeline: timeline?,
        stories: stories?,
        benefits: benefits?,
    })
}

/// Published stories the store holds that the server did not send, such as
/// locally published submissions and freshly replayed ones.
fn published_local_only(store: &LocalStore, server: &[Story]) -> Vec<Story> {
    let known: HashSet<&RecordId> = server.iter().map(|s| &s.id).collect();
    load_or_empty::<Story>(store)
        .into_iter()
        .filter(|s| s.status == StoryStatus::Published && !known.contains(&s.id))
        .collect()
}

fn load_or_empty<R: Record>(store: &LocalStore) -> Vec<R> {
    match store.load_all::<R>() {
        Ok(items) => items,
        Err(e) => {
            warn!("could not read {} from local store: {e}", R::COLLECTION);
            Vec::new()
        }
    }
}
