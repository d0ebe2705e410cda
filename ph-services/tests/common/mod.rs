//! Shared test utilities for integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::{Notify, Semaphore};

use ph_api::{ContentSource, StoryDelivery};
use ph_core::config::DatabaseConfig;
use ph_core::error::{PhError, PhResult};
use ph_models::{Benefit, LocalStore, Story, TimelineEvent};
use ph_services::event_bus::EventBus;
use ph_services::queue::PendingQueue;
use ph_services::state::{new_shared_state, SharedState};
use ph_services::submission::StoryForm;
use ph_services::sync::{ReplayCoordinator, SyncService};

/// Open a store in a fresh temp directory. Hold the TempDir for the test.
pub fn create_test_store() -> (LocalStore, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let store = open_store_at(&dir);
    assert!(store.is_available());
    (store, dir)
}

pub fn open_store_at(dir: &TempDir) -> LocalStore {
    LocalStore::open(&dir.path().join("test.db"), &DatabaseConfig::default())
}

pub fn create_test_event_bus() -> EventBus {
    EventBus::new(64)
}

pub fn event(id: i64, year: i32, title: &str) -> TimelineEvent {
    serde_json::from_value(serde_json::json!({ "id": id, "year": year, "title": title }))
        .expect("valid timeline event")
}

pub fn published_story(id: &str, date: &str) -> Story {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "author": "Server author",
        "kindergarten": "Sunflower",
        "text": "A published story.",
        "date": date
    }))
    .expect("valid story")
}

pub fn queued_story(id: &str) -> Story {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "author": "Visitor",
        "kindergarten": "Rainbow",
        "text": "Written offline.",
        "date": "2024-06-01T09:00:00Z",
        "status": "offline"
    }))
    .expect("valid story")
}

pub fn benefit(id: &str) -> Benefit {
    serde_json::from_value(serde_json::json!({ "id": id, "title": id })).expect("valid benefit")
}

pub fn valid_form() -> StoryForm {
    StoryForm {
        author: "Maria".into(),
        kindergarten: "Sunny Meadow".into(),
        year: Some("1987".into()),
        role: "parent".into(),
        text: "My daughter's first day.".into(),
        privacy: true,
        ..Default::default()
    }
}

/// Content source serving fixed collections, or failing on demand.
pub struct FakeSource {
    pub timeline: Vec<TimelineEvent>,
    pub stories: Vec<Story>,
    pub benefits: Vec<Benefit>,
    pub fail_timeline: AtomicBool,
    pub fail_stories: AtomicBool,
    pub fail_benefits: AtomicBool,
}

impl FakeSource {
    pub fn with_content() -> Self {
        Self {
            timeline: vec![event(1, 1934, "First kindergarten"), event(2, 1961, "New building")],
            stories: vec![published_story("s1", "2023-05-01")],
            benefits: vec![benefit("b1"), benefit("b2"), benefit("b3")],
            fail_timeline: AtomicBool::new(false),
            fail_stories: AtomicBool::new(false),
            fail_benefits: AtomicBool::new(false),
        }
    }

    pub fn failing() -> Self {
        let source = Self::with_content();
        source.fail_all(true);
        source
    }

    pub fn fail_all(&self, fail: bool) {
        self.fail_timeline.store(fail, Ordering::SeqCst);
        self.fail_stories.store(fail, Ordering::SeqCst);
        self.fail_benefits.store(fail, Ordering::SeqCst);
    }
}

fn offline() -> PhError {
    PhError::Network("connection refused".into())
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn fetch_timeline(&self) -> PhResult<Vec<TimelineEvent>> {
        if self.fail_timeline.load(Ordering::SeqCst) {
            return Err(offline());
        }
        Ok(self.timeline.clone())
    }

    async fn fetch_stories(&self) -> PhResult<Vec<Story>> {
        if self.fail_stories.load(Ordering::SeqCst) {
            return Err(offline());
        }
        Ok(self.stories.clone())
    }

    async fn fetch_benefits(&self) -> PhResult<Vec<Benefit>> {
        if self.fail_benefits.load(Ordering::SeqCst) {
            return Err(offline());
        }
        Ok(self.benefits.clone())
    }
}

/// Records deliveries; fails chosen ids; optionally waits on a gate.
#[derive(Default)]
pub struct ScriptedDelivery {
    pub delivered: Mutex<Vec<String>>,
    pub attempts: AtomicUsize,
    pub fail_ids: Mutex<HashSet<String>>,
    pub fail_all: AtomicBool,
    gate: Option<Arc<Semaphore>>,
    pub entered: Arc<Notify>,
}

impl ScriptedDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delivery blocks until `release` hands out a permit.
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        }
    }

    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn fail_on(&self, id: &str) {
        self.fail_ids.lock().unwrap().insert(id.to_string());
    }

    pub fn delivered_ids(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl StoryDelivery for ScriptedDelivery {
    async fn deliver(&self, story: &Story) -> PhResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        let id = story.id.to_string();
        if self.fail_all.load(Ordering::SeqCst) || self.fail_ids.lock().unwrap().contains(&id) {
            return Err(PhError::ServerError {
                status: 503,
                message: "unavailable".into(),
            });
        }
        self.delivered.lock().unwrap().push(id);
        Ok(())
    }
}

/// Queue, state and coordinator wired over `store`.
pub struct ReplayHarness {
    pub queue: PendingQueue,
    pub state: SharedState,
    pub bus: EventBus,
    pub coordinator: ReplayCoordinator,
}

pub fn replay_harness(store: &LocalStore, delivery: Arc<ScriptedDelivery>) -> ReplayHarness {
    let queue = PendingQueue::new(store.clone());
    let state = new_shared_state();
    let bus = create_test_event_bus();
    let sync = Arc::new(SyncService::new(
        queue.clone(),
        delivery,
        store.clone(),
        state.clone(),
        bus.clone(),
    ));
    ReplayHarness {
        queue,
        state,
        bus,
        coordinator: ReplayCoordinator::new(sync),
    }
}
