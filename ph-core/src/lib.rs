//! Preschool History Core - Foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by all other Preschool History crates:
//! - Application configuration (content server, submission mode, storage, sync cadence)
//! - The error taxonomy shared by the store, loader, queue and submission paths
//! - Structured logging with tracing
//! - Platform data/config directories
//! - Well-known names: database id, collection names, storage keys, sync tag

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod platform;

// Re-export commonly used items at the crate root
pub use config::{AppConfig, ConfigHandle};
pub use error::{PhError, PhResult};
pub use logging::init_logging;
pub use platform::Platform;
