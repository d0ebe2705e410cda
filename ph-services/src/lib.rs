//! Preschool History Services - offline content and story sync.
//!
//! This crate provides:
//! - Content loading, network first with the local store as fallback
//! - The pending-submission queue and its in-order replay
//! - A single-flight replay coordinator shared by every trigger
//! - Connectivity monitoring and background sync registrations
//! - Story submission with validation, drafts and the first-visit flag
//! - Page views and the application lifecycle that wires it all together

pub mod background;
pub mod connectivity;
pub mod draft;
pub mod event_bus;
pub mod lifecycle;
pub mod loader;
pub mod pages;
pub mod queue;
pub mod state;
pub mod submission;
pub mod sync;
pub mod visits;

// Re-export key types
pub use background::BackgroundSync;
pub use connectivity::{ConnectivityMonitor, ConnectivityProbe, ConnectivityState};
pub use draft::DraftService;
pub use event_bus::{AppEvent, ContentCounts, EventBus, LoadSource};
pub use lifecycle::{Application, LifecyclePhase};
pub use loader::{ContentLoader, LoadReport};
pub use pages::{Page, PageView};
pub use queue::PendingQueue;
pub use state::{ContentState, SharedState};
pub use submission::{StoryForm, SubmissionOutcome, SubmissionService, ValidationIssue};
pub use sync::{ReplayCoordinator, ReplayReport, ReplayTrigger, SyncService};
pub use visits::VisitTracker;
