//! CLI command implementations.

pub mod config;
pub mod content;
pub mod db;
pub mod draft;
pub mod queue;
pub mod submit;
pub mod sync;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use ph_api::ApiClient;
use ph_core::config::ConfigHandle;
use ph_core::error::PhResult;
use ph_models::LocalStore;
use ph_services::Application;

/// Helper to open the local store from config.
pub async fn open_store(config: &ConfigHandle) -> PhResult<LocalStore> {
    let config = config.read().await;
    let db_path = config.effective_db_path()?;
    let store = LocalStore::open(&db_path, &config.database);
    Ok(store)
}

/// Helper to create an API client from config.
pub async fn create_api_client(config: &ConfigHandle) -> PhResult<ApiClient> {
    let config = config.read().await;
    ApiClient::from_config(&config)
}

/// A started application plus the sender that keeps its connectivity signal open.
pub struct Session {
    pub app: Application,
    _signal: watch::Sender<bool>,
}

/// Build and start the application. With `force_offline` the signal starts
/// offline and no probe is made.
pub async fn start_app(config: &ConfigHandle, force_offline: bool) -> PhResult<Session> {
    let api = Arc::new(create_api_client(config).await?);
    let online = !force_offline && api.health_check().await.is_ok();
    debug!("initial connectivity: {}", if online { "online" } else { "offline" });

    let (tx, rx) = watch::channel(online);
    let app = build_app(config, api, rx).await;
    Ok(Session { app, _signal: tx })
}

/// Build the application around `api` and `signal`, then load content.
pub async fn build_app(
    config: &ConfigHandle,
    api: Arc<ApiClient>,
    signal: watch::Receiver<bool>,
) -> Application {
    let mut app = Application::new(config.snapshot().await, api.clone(), api, signal);
    app.start().await;
    app
}

/// Format a byte count as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Truncate a string to a maximum number of characters, appending an ellipsis if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Детский сад номер один", 10), "Детский...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
