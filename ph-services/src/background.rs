//! Background sync trigger.
//!
//! A registration asks for a replay "some time later, when online",
//! independent of any foreground activity. Registrations are tags persisted
//! under `backgroundSyncTags`; the only tag with a handler is
//! `sync-stories`. A registration is dropped once a replay leaves the queue
//! empty, and stays otherwise so the next firing tries again.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use ph_core::constants::{keys, SYNC_STORIES_TAG};
use ph_core::error::{PhError, PhResult};
use ph_models::LocalStore;

use crate::event_bus::{AppEvent, EventBus};
use crate::sync::{ReplayCoordinator, ReplayReport};

#[derive(Clone)]
pub struct BackgroundSync {
    store: LocalStore,
    coordinator: ReplayCoordinator,
    event_bus: EventBus,
    /// Registrations when the store cannot hold them.
    memory: Arc<Mutex<BTreeSet<String>>>,
}

impl BackgroundSync {
    pub fn new(store: LocalStore, coordinator: ReplayCoordinator, event_bus: EventBus) -> Self {
        Self {
            store,
            coordinator,
            event_bus,
            memory: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }

    fn read(&self, memory: &BTreeSet<String>) -> BTreeSet<String> {
        match self.store.kv_get_json::<BTreeSet<String>>(keys::BACKGROUND_SYNC_TAGS) {
            Ok(Some(tags)) => tags,
            Ok(None) => BTreeSet::new(),
            Err(_) => memory.clone(),
        }
    }

    fn write(&self, memory: &mut BTreeSet<String>, tags: BTreeSet<String>) {
        if let Err(e) = self.store.kv_set_json(keys::BACKGROUND_SYNC_TAGS, &tags) {
            debug!("sync registrations kept in memory only: {e}");
        }
        *memory = tags;
    }

    /// Record a registration for `tag`. Registering twice is a no-op.
    pub async fn register(&self, tag: &str) -> PhResult<()> {
        if tag != SYNC_STORIES_TAG {
            return Err(PhError::Internal(format!("unknown background sync tag {tag}")));
        }

        let mut memory = self.memory.lock().await;
        let mut tags = self.read(&memory);
        if tags.insert(tag.to_string()) {
            self.write(&mut memory, tags);
            info!("registered background sync {tag}");
        }
        drop(memory);

        self.event_bus.emit(AppEvent::BackgroundSyncRequested {
            tag: tag.to_string(),
        });
        Ok(())
    }

    pub async fn registrations(&self) -> BTreeSet<String> {
        let memory = self.memory.lock().await;
        self.read(&memory)
    }

    pub async fn is_registered(&self, tag: &str) -> bool {
        self.registrations().await.contains(tag)
    }

    async fn unregister(&self, tag: &str) {
        let mut memory = self.memory.lock().await;
        let mut tags = self.read(&memory);
        if tags.remove(tag) {
            self.write(&mut memory, tags);
            debug!("background sync {tag} satisfied");
        }
    }

    /// The platform firing a registered tag. Runs replay through the
    /// coordinator; `None` when a replay was already in flight.
    pub async fn fire(&self, tag: &str) -> Option<ReplayReport> {
        if tag != SYNC_STORIES_TAG {
            warn!("no handler for background sync tag {tag}");
            return None;
        }

        let report = self.coordinator.run_now("background sync").await?;
        if report.is_complete() {
            self.unregister(tag).await;
        }
        Some(report)
    }

    /// Fire every registration on a fixed cadence while the signal reads
    /// online.
    pub fn spawn_scheduler(
        self,
        interval: Duration,
        online: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !*online.borrow() {
                    continue;
                }
                for tag in self.registrations().await {
                    if let Some(report) = self.fire(&tag).await {
                        debug!(
                            "background sync {tag}: {} delivered, {} remaining",
                            report.delivered, report.remaining
                        );
                    }
                }
            }
        })
    }
}
