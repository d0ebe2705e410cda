//! Application configuration management.
//!
//! Configuration is persisted as TOML. Every field carries a serde default so
//! a partial (or missing) file yields a usable configuration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::constants::{self, resources};
use crate::error::{PhError, PhResult};
use crate::platform::Platform;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Content server connection settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Content resource locations.
    #[serde(default)]
    pub content: ContentConfig,

    /// Story submission settings.
    #[serde(default)]
    pub submission: SubmissionConfig,

    /// Local store settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Connectivity and background sync cadence.
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Content server connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Site origin serving the JSON resources (e.g. "https://example.org").
    #[serde(default = "default_address")]
    pub address: String,

    /// Extra HTTP headers sent with every request.
    #[serde(default)]
    pub custom_headers: HashMap<String, String>,

    /// Request timeout in milliseconds.
    #[serde(default = "default_api_timeout")]
    pub api_timeout_ms: u64,

    /// Accept self-signed TLS certificates (local test servers).
    #[serde(default)]
    pub accept_self_signed_certs: bool,
}

/// Paths of the three content resources, relative to the server address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default = "default_timeline_path")]
    pub timeline_path: String,

    #[serde(default = "default_stories_path")]
    pub stories_path: String,

    #[serde(default = "default_benefits_path")]
    pub benefits_path: String,

    /// Resource requested by the reachability probe.
    #[serde(default = "default_timeline_path")]
    pub probe_path: String,
}

/// Where an online submission goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionMode {
    /// Publish locally without contacting a server.
    #[default]
    Local,
    /// POST to the submission endpoint; queue on failure.
    Remote,
}

/// Story submission configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    #[serde(default)]
    pub mode: SubmissionMode,

    /// Submission endpoint path, relative to the server address.
    #[serde(default = "default_submit_path")]
    pub endpoint_path: String,

    #[serde(default = "default_min_year")]
    pub min_year: i32,

    #[serde(default = "default_max_photo_bytes")]
    pub max_photo_bytes: usize,
}

/// Local store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path. Empty means the platform default.
    #[serde(default)]
    pub path: String,

    #[serde(default = "default_true")]
    pub wal_mode: bool,

    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    #[serde(default = "default_true")]
    pub integrity_check_on_startup: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive ("info", "ph_services=debug", ...).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log directory. Empty means `<data_dir>/logs`.
    #[serde(default)]
    pub directory: String,

    /// Write the log file as JSON lines.
    #[serde(default)]
    pub json_output: bool,
}

/// Connectivity probing and background sync cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Seconds between reachability probes.
    #[serde(default = "default_probe_interval")]
    pub probe_interval_secs: u64,

    /// Seconds between background sync dispatches.
    #[serde(default = "default_background_interval")]
    pub background_interval_secs: u64,

    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

// Default value functions for serde

fn default_address() -> String {
    "http://localhost:8080".to_string()
}

fn default_api_timeout() -> u64 {
    constants::DEFAULT_API_TIMEOUT_MS
}

fn default_timeline_path() -> String {
    resources::TIMELINE.to_string()
}

fn default_stories_path() -> String {
    resources::STORIES.to_string()
}

fn default_benefits_path() -> String {
    resources::BENEFITS.to_string()
}

fn default_submit_path() -> String {
    resources::SUBMIT_STORY.to_string()
}

fn default_min_year() -> i32 {
    constants::MIN_STORY_YEAR
}

fn default_max_photo_bytes() -> usize {
    constants::MAX_PHOTO_BYTES
}

fn default_true() -> bool {
    true
}

fn default_pool_size() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_probe_interval() -> u64 {
    15
}

fn default_background_interval() -> u64 {
    60
}

fn default_event_bus_capacity() -> usize {
    constants::DEFAULT_EVENT_BUS_CAPACITY
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            custom_headers: HashMap::new(),
            api_timeout_ms: default_api_timeout(),
            accept_self_signed_certs: false,
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            timeline_path: default_timeline_path(),
            stories_path: default_stories_path(),
            benefits_path: default_benefits_path(),
            probe_path: default_timeline_path(),
        }
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            mode: SubmissionMode::Local,
            endpoint_path: default_submit_path(),
            min_year: default_min_year(),
            max_photo_bytes: default_max_photo_bytes(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            wal_mode: true,
            pool_size: default_pool_size(),
            integrity_check_on_startup: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            probe_interval_secs: default_probe_interval(),
            background_interval_secs: default_background_interval(),
            event_bus_capacity: default_event_bus_capacity(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default config file path, or defaults if absent.
    pub fn load_default() -> PhResult<Self> {
        let path = Self::default_config_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> PhResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> PhResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| PhError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PhResult<PathBuf> {
        Ok(Platform::config_dir()?.join("config.toml"))
    }

    /// Get the effective database path, using the configured path or the default.
    pub fn effective_db_path(&self) -> PhResult<PathBuf> {
        if self.database.path.is_empty() {
            Ok(Platform::data_dir()?.join(constants::DB_FILE_NAME))
        } else {
            Ok(PathBuf::from(&self.database.path))
        }
    }

    /// Get the effective log directory, using the configured path or the default.
    pub fn effective_log_dir(&self) -> PhResult<PathBuf> {
        if self.logging.directory.is_empty() {
            Ok(Platform::data_dir()?.join("logs"))
        } else {
            Ok(PathBuf::from(&self.logging.directory))
        }
    }

    /// Normalise a server address: trim quotes and whitespace, default the
    /// scheme to http, and strip trailing slashes.
    pub fn sanitize_server_address(address: &str) -> String {
        let trimmed = address.trim().trim_matches('"').trim();
        if trimmed.is_empty() {
            return String::new();
        }

        let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };

        with_scheme.trim_end_matches('/').to_string()
    }
}

/// Thread-safe configuration holder for shared access across services.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<AppConfig>>,
}

impl ConfigHandle {
    /// Create a new configuration handle.
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Read the configuration.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.read().await
    }

    /// Write/update the configuration.
    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, AppConfig> {
        self.inner.write().await
    }

    /// Clone the current configuration out of the lock.
    pub async fn snapshot(&self) -> AppConfig {
        self.inner.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.api_timeout_ms, 30_000);
        assert_eq!(config.submission.mode, SubmissionMode::Local);
        assert_eq!(config.submission.min_year, 1920);
        assert_eq!(config.content.stories_path, "data/stories-data.json");
        assert!(config.database.wal_mode);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_sanitize_server_address() {
        assert_eq!(
            AppConfig::sanitize_server_address("example.org/"),
            "http://example.org"
        );
        assert_eq!(
            AppConfig::sanitize_server_address("  \"https://example.org//\"  "),
            "https://example.org"
        );
        assert_eq!(AppConfig::sanitize_server_address("   "), "");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [submission]
            mode = "remote"

            [sync]
            probe_interval_secs = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.submission.mode, SubmissionMode::Remote);
        assert_eq!(config.submission.endpoint_path, "api/stories");
        assert_eq!(config.sync.probe_interval_secs, 3);
        assert_eq!(config.sync.background_interval_secs, 60);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.server.address = "https://site.example".into();
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.server.address, "https://site.example");
    }

    #[test]
    fn test_effective_db_path_prefers_configured() {
        let mut config = AppConfig::default();
        config.database.path = "/tmp/custom.db".into();
        assert_eq!(
            config.effective_db_path().unwrap(),
            PathBuf::from("/tmp/custom.db")
        );
    }
}
