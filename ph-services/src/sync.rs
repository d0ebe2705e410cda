//! Replay of the pending queue.
//!
//! `SyncService::replay` walks the queue front to back and delivers one story
//! at a time. A delivered story becomes published in the store and in memory
//! and only then leaves the queue. The first failure ends the pass; the
//! failed story and everything behind it stay queued for the next trigger.
//!
//! Every trigger (connectivity, background sync, the CLI) goes through a
//! single `ReplayCoordinator`, which allows one pass at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use ph_api::StoryDelivery;
use ph_models::{LocalStore, StoryStatus};

use crate::event_bus::{AppEvent, EventBus};
use crate::queue::PendingQueue;
use crate::state::SharedState;

/// The story a replay pass stopped at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayFailure {
    pub story_id: String,
    pub error: String,
}

/// Outcome of one replay pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub attempted: usize,
    pub delivered: usize,
    pub remaining: usize,
    pub failure: Option<ReplayFailure>,
}

impl ReplayReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.remaining == 0
    }
}

pub struct SyncService {
    queue: PendingQueue,
    delivery: Arc<dyn StoryDelivery>,
    store: LocalStore,
    state: SharedState,
    event_bus: EventBus,
}

impl SyncService {
    pub fn new(
        queue: PendingQueue,
        delivery: Arc<dyn StoryDelivery>,
        store: LocalStore,
        state: SharedState,
        event_bus: EventBus,
    ) -> Self {
        Self {
            queue,
            delivery,
            store,
            state,
            event_bus,
        }
    }

    pub fn queue(&self) -> &PendingQueue {
        &self.queue
    }

    /// Deliver queued stories in order until the queue is empty or one fails.
    pub async fn replay(&self) -> ReplayReport {
        let pending = self.queue.snapshot().await;
        let mut report = ReplayReport {
            remaining: pending.len(),
            ..Default::default()
        };

        if pending.is_empty() {
            debug!("replay: nothing pending");
            return report;
        }

        info!("replaying {} pending stories", pending.len());
        self.event_bus.emit(AppEvent::ReplayStarted {
            pending: pending.len(),
        });

        for mut story in pending {
            report.attempted += 1;

            if let Err(e) = self.delivery.deliver(&story).await {
                warn!("delivery of story {} failed, stopping replay: {e}", story.id);
                report.remaining = self.queue.len().await;
                report.failure = Some(ReplayFailure {
                    story_id: story.id.to_string(),
                    error: e.to_string(),
                });
                self.event_bus.emit(AppEvent::ReplayStopped {
                    story_id: story.id.to_string(),
                    error: e.to_string(),
                    remaining: report.remaining,
                });
                return report;
            }

            story.status = StoryStatus::Published;
            if let Err(e) = self.store.put(&story) {
                warn!("could not store published story {}: {e}", story.id);
            }
            self.state.write().await.upsert_story(story.clone());
            self.event_bus.emit(AppEvent::StoryPublished {
                story_id: story.id.to_string(),
            });
            if let Err(e) = self.queue.remove(&story.id).await {
                warn!("delivered story {} is still queued: {e}", story.id);
            }
            report.delivered += 1;
        }

        report.remaining = self.queue.len().await;
        info!(
            "replay finished: {} delivered, {} remaining",
            report.delivered, report.remaining
        );
        self.event_bus.emit(AppEvent::ReplayFinished {
            delivered: report.delivered,
            remaining: report.remaining,
        });
        report
    }
}

/// Result of asking the coordinator for a replay.
#[derive(Debug)]
pub enum ReplayTrigger {
    /// A new pass was spawned.
    Started(JoinHandle<ReplayReport>),
    /// A pass was already running; this trigger was dropped.
    Coalesced,
}

impl ReplayTrigger {
    pub fn is_started(&self) -> bool {
        matches!(self, ReplayTrigger::Started(_))
    }

    /// Wait for the spawned pass. `None` when the trigger was coalesced.
    pub async fn finished(self) -> Option<ReplayReport> {
        match self {
            ReplayTrigger::Started(handle) => match handle.await {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!("replay task failed: {e}");
                    None
                }
            },
            ReplayTrigger::Coalesced => None,
        }
    }
}

/// Single-flight gate in front of `SyncService::replay`.
#[derive(Clone)]
pub struct ReplayCoordinator {
    sync: Arc<SyncService>,
    running: Arc<AtomicBool>,
}

impl ReplayCoordinator {
    pub fn new(sync: Arc<SyncService>) -> Self {
        Self {
            sync,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn queue(&self) -> &PendingQueue {
        self.sync.queue()
    }

    /// Start a replay pass unless one is already in flight.
    pub fn trigger(&self, reason: &str) -> ReplayTrigger {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("replay already running, ignoring trigger from {reason}");
            return ReplayTrigger::Coalesced;
        }

        info!("replay triggered by {reason}");
        let sync = self.sync.clone();
        let guard = RunningGuard(self.running.clone());
        ReplayTrigger::Started(tokio::spawn(async move {
            let _guard = guard;
            sync.replay().await
        }))
    }

    /// Trigger and wait. `None` when another pass was already running.
    pub async fn run_now(&self, reason: &str) -> Option<ReplayReport> {
        self.trigger(reason).finished().await
    }
}

/// Clears the in-flight flag when the pass ends, even by panic.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
