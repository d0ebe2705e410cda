//! Preschool History Models - entity models and local persistence.
//!
//! This crate owns everything that touches durable local storage:
//! SQLite initialization with a versioned schema, the three mirrored content
//! collections (timeline, stories, benefits), the key-value table used for
//! the pending queue and small flags, and `LocalStore`, the best-effort
//! handle the services hold.

pub mod collection;
pub mod content_store;
pub mod db;
pub mod kv;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod store;

// Re-export key types
pub use collection::{Collection, Record};
pub use db::{Database, DatabaseStats, DbPool};
pub use kv::KeyValue;
pub use models::benefit::Benefit;
pub use models::draft::StoryDraft;
pub use models::record_id::RecordId;
pub use models::story::{Story, StoryStatus};
pub use models::timeline_event::{StatValue, TimelineEvent};
pub use store::LocalStore;
