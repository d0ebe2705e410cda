pub mod benefit;
pub mod draft;
pub mod record_id;
pub mod story;
pub mod timeline_event;
