//! Application lifecycle: ordered construction, startup and shutdown.
//!
//! `Application::new` builds every service explicitly, in dependency order:
//! store, event bus, state, queue, replay, background sync, drafts, visits,
//! submission, loader. `start` loads content and moves to `Ready`; pages
//! cannot be viewed before that.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use ph_api::{ContentSource, StoryDelivery};
use ph_core::config::AppConfig;
use ph_core::error::{PhError, PhResult};
use ph_models::LocalStore;

use crate::background::BackgroundSync;
use crate::connectivity::ConnectivityMonitor;
use crate::draft::DraftService;
use crate::event_bus::EventBus;
use crate::loader::{ContentLoader, LoadReport};
use crate::pages::{Page, PageView};
use crate::queue::PendingQueue;
use crate::state::{new_shared_state, SharedState};
use crate::submission::{StoryForm, SubmissionOutcome, SubmissionService};
use crate::sync::{ReplayCoordinator, ReplayReport, SyncService};
use crate::visits::VisitTracker;

/// Application lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Services are built but content has not been loaded.
    Starting,
    /// Content is loaded; pages can be viewed.
    Ready,
    ShuttingDown,
    Stopped,
}

impl std::fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Starting => write!(f, "starting"),
            Self::Ready => write!(f, "ready"),
            Self::ShuttingDown => write!(f, "shutting_down"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

pub struct Application {
    config: AppConfig,
    phase: LifecyclePhase,
    store: LocalStore,
    event_bus: EventBus,
    state: SharedState,
    queue: PendingQueue,
    coordinator: ReplayCoordinator,
    background: BackgroundSync,
    drafts: DraftService,
    visits: VisitTracker,
    submission: SubmissionService,
    loader: ContentLoader,
    signal: watch::Receiver<bool>,
    tasks: Vec<JoinHandle<()>>,
    last_load: Option<LoadReport>,
}

impl Application {
    /// Build every service. Opens the local store at the configured path.
    pub fn new(
        config: AppConfig,
        source: Arc<dyn ContentSource>,
        delivery: Arc<dyn StoryDelivery>,
        signal: watch::Receiver<bool>,
    ) -> Self {
        let store = match config.effective_db_path() {
            Ok(path) => LocalStore::open(&path, &config.database),
            Err(e) => {
                warn!("no location for local storage: {e}");
                LocalStore::unavailable(e.to_string())
            }
        };
        Self::with_store(config, store, source, delivery, signal)
    }

    /// Build every service around an already opened store.
    pub fn with_store(
        config: AppConfig,
        store: LocalStore,
        source: Arc<dyn ContentSource>,
        delivery: Arc<dyn StoryDelivery>,
        signal: watch::Receiver<bool>,
    ) -> Self {
        let event_bus = EventBus::new(config.sync.event_bus_capacity);
        let state = new_shared_state();
        let queue = PendingQueue::new(store.clone());
        let sync = Arc::new(SyncService::new(
            queue.clone(),
            delivery.clone(),
            store.clone(),
            state.clone(),
            event_bus.clone(),
        ));
        let coordinator = ReplayCoordinator::new(sync);
        let background = BackgroundSync::new(store.clone(), coordinator.clone(), event_bus.clone());
        let drafts = DraftService::new(store.clone());
        let visits = VisitTracker::new(store.clone());
        let submission = SubmissionService::new(
            config.submission.clone(),
            store.clone(),
            queue.clone(),
            delivery,
            background.clone(),
            drafts.clone(),
            state.clone(),
            event_bus.clone(),
            signal.clone(),
        );
        let loader = ContentLoader::new(source, store.clone(), state.clone(), event_bus.clone());

        Self {
            config,
            phase: LifecyclePhase::Starting,
            store,
            event_bus,
            state,
            queue,
            coordinator,
            background,
            drafts,
            visits,
            submission,
            loader,
            signal,
            tasks: Vec::new(),
            last_load: None,
        }
    }

    /// `new` followed by `start`.
    pub async fn bootstrap(
        config: AppConfig,
        source: Arc<dyn ContentSource>,
        delivery: Arc<dyn StoryDelivery>,
        signal: watch::Receiver<bool>,
    ) -> Self {
        let mut app = Self::new(config, source, delivery, signal);
        app.start().await;
        app
    }

    /// Load content and become ready.
    pub async fn start(&mut self) -> &LoadReport {
        info!(
            "starting application (storage {})",
            if self.store.is_available() { "available" } else { "unavailable" }
        );
        let report = self.loader.load().await;
        self.phase = LifecyclePhase::Ready;
        info!("application ready: {} from {}", report.counts, report.source);
        self.last_load.insert(report)
    }

    /// Load content again, e.g. after coming back online.
    pub async fn reload(&mut self) -> PhResult<&LoadReport> {
        self.ensure_ready()?;
        let report = self.loader.load().await;
        Ok(self.last_load.insert(report))
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn queue(&self) -> &PendingQueue {
        &self.queue
    }

    pub fn coordinator(&self) -> &ReplayCoordinator {
        &self.coordinator
    }

    pub fn background(&self) -> &BackgroundSync {
        &self.background
    }

    pub fn drafts(&self) -> &DraftService {
        &self.drafts
    }

    pub fn loader(&self) -> &ContentLoader {
        &self.loader
    }

    pub fn last_load(&self) -> Option<&LoadReport> {
        self.last_load.as_ref()
    }

    fn ensure_ready(&self) -> PhResult<()> {
        if self.phase == LifecyclePhase::Ready {
            Ok(())
        } else {
            Err(PhError::ServiceNotInitialized(format!(
                "application is {}",
                self.phase
            )))
        }
    }

    pub async fn submit(&self, form: StoryForm) -> PhResult<SubmissionOutcome> {
        self.ensure_ready()?;
        self.submission.submit(form).await
    }

    /// Replay now and wait for it. `None` when a replay was already running.
    pub async fn replay_now(&self) -> Option<ReplayReport> {
        self.coordinator.run_now("manual sync").await
    }

    /// Build the data for a page.
    pub async fn view(&self, page: Page) -> PhResult<PageView> {
        self.ensure_ready()?;
        let state = self.state.read().await;

        let view = match page {
            Page::Home => {
                let first_visit = self.visits.is_first_visit();
                if first_visit {
                    self.visits.mark_visited();
                }
                PageView::Home {
                    first_visit,
                    counts: state.counts(),
                    pending: self.queue.len().await,
                }
            }
            Page::History => PageView::History {
                timeline: state.timeline_sorted(),
            },
            Page::Stories => PageView::Stories {
                stories: state.stories_newest_first(),
            },
            Page::AddStory => PageView::AddStory {
                draft: self.drafts.load().unwrap_or_default(),
                pending: self.queue.len().await,
            },
            Page::Benefits => PageView::Benefits {
                benefits: state.benefits.clone(),
            },
            Page::About => PageView::About,
        };
        Ok(view)
    }

    /// Follow the connectivity signal and replay on reconnect.
    pub fn start_monitor(&mut self) {
        let initial = *self.signal.borrow();
        let monitor = ConnectivityMonitor::new(self.coordinator.clone(), self.event_bus.clone(), initial);
        self.tasks.push(monitor.spawn(self.signal.clone()));
    }

    /// Fire background sync registrations periodically while online.
    pub fn start_background_sync(&mut self) {
        let interval = Duration::from_secs(self.config.sync.background_interval_secs.max(1));
        let task = self
            .background
            .clone()
            .spawn_scheduler(interval, self.signal.clone());
        self.tasks.push(task);
    }

    /// Stop background tasks and let a pending mirror finish.
    pub async fn shutdown(&mut self) {
        info!("shutting down");
        self.phase = LifecyclePhase::ShuttingDown;

        for task in self.tasks.drain(..) {
            task.abort();
        }
        if let Err(e) = self.loader.wait_for_mirror().await {
            warn!("content mirror did not finish: {e}");
        }

        self.phase = LifecyclePhase::Stopped;
        info!("shutdown complete");
    }
}
