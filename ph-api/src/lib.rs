//! Preschool History API - HTTP access to the content server.
//!
//! Typed fetches for the three static JSON resources, the story submission
//! endpoint, and a reachability probe. The services consume these through
//! the `ContentSource`, `StoryDelivery` and `Reachability` traits.

pub mod client;
pub mod endpoints;
pub mod source;

// Re-export key types
pub use client::{ApiClient, Routes};
pub use source::{ContentSource, Reachability, StoryDelivery};
