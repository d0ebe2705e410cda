//! Application-wide constants.

/// Application name.
pub const APP_NAME: &str = "Preschool History";

/// Directory name used under the platform data/config directories.
pub const APP_DIR_NAME: &str = "PreschoolHistory";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Identifier of the embedded content database.
pub const DB_NAME: &str = "PreschoolHistoryDB";

/// Default database file name.
pub const DB_FILE_NAME: &str = "preschool-history.db";

/// Database schema version. Bumping it re-runs collection setup for the new version.
pub const DB_SCHEMA_VERSION: i32 = 1;

/// Default request timeout in milliseconds (the platform network timeout).
pub const DEFAULT_API_TIMEOUT_MS: u64 = 30_000;

/// Earliest year a story may refer to.
pub const MIN_STORY_YEAR: i32 = 1920;

/// Largest accepted story photo, decoded, in bytes (5 MiB).
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Default event bus capacity.
pub const DEFAULT_EVENT_BUS_CAPACITY: usize = 256;

/// Background sync tag that replays pending stories.
pub const SYNC_STORIES_TAG: &str = "sync-stories";

/// Content resource paths relative to the server address.
pub mod resources {
    pub const TIMELINE: &str = "data/timeline-data.json";
    pub const STORIES: &str = "data/stories-data.json";
    pub const BENEFITS: &str = "data/benefits-data.json";

    /// Story submission endpoint.
    pub const SUBMIT_STORY: &str = "api/stories";
}

/// Key-value storage keys.
pub mod keys {
    /// Ordered list of stories awaiting delivery.
    pub const PENDING_STORIES: &str = "pendingStories";
    /// Autosaved submission form.
    pub const STORY_DRAFT: &str = "storyDraft";
    /// Set once the welcome message has been shown.
    pub const HAS_VISITED: &str = "hasVisited";
    /// Outstanding background sync registrations.
    pub const BACKGROUND_SYNC_TAGS: &str = "backgroundSyncTags";
}
