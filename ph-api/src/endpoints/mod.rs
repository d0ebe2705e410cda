//! Endpoint groups.
//!
//! Each module adds typed methods for related resources to `ApiClient`.

pub mod content;
pub mod stories;
