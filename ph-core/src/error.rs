//! Error taxonomy for Preschool History.
//!
//! Every failure in the store, loader, queue and submission paths is one of
//! the `PhError` variants below. None of them is fatal to the application:
//! network failures fall back to the local store, storage failures degrade to
//! in-memory operation, validation failures are reported to the caller and
//! delivery failures leave the story queued.

use thiserror::Error;

/// Convenience type alias for Results using PhError.
pub type PhResult<T> = Result<T, PhError>;

/// Unified error type covering all error categories.
#[derive(Error, Debug)]
pub enum PhError {
    // -- Configuration errors --
    /// Failed to load or parse application configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    // -- Storage errors --
    /// The embedded store could not be opened, read or written
    /// (quota, permissions, disabled, corrupt file).
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A schema migration failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(String),

    /// Database integrity check failed.
    #[error("database integrity check failed: {0}")]
    IntegrityCheck(String),

    // -- Network errors --
    /// Request could not be sent or the connection dropped.
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Server answered with a non-2xx status.
    #[error("server error (status {status}): {message}")]
    ServerError {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// Response body could not be decoded into the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    // -- Submission errors --
    /// Form input was rejected. Each entry is one human-readable issue.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// A queued story could not be delivered to the submission endpoint.
    #[error("delivery of story {id} failed: {reason}")]
    DeliveryFailed {
        /// Story id.
        id: String,
        /// Underlying cause.
        reason: String,
    },

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    // -- Service errors --
    /// A component was used before the application finished bootstrapping.
    #[error("service not initialized: {0}")]
    ServiceNotInitialized(String),

    // -- Generic --
    /// A named item (page, draft, queued story) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PhError {
    /// Whether this error belongs to the network-failure family
    /// (fetch failure, timeout or non-2xx status).
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            PhError::Network(_) | PhError::Timeout(_) | PhError::ServerError { .. }
        )
    }

    /// Whether this error means the local store cannot be used.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            PhError::StorageUnavailable(_)
                | PhError::Migration(_)
                | PhError::Pool(_)
                | PhError::IntegrityCheck(_)
        )
    }
}

impl From<serde_json::Error> for PhError {
    fn from(e: serde_json::Error) -> Self {
        PhError::Decode(e.to_string())
    }
}

impl From<toml::de::Error> for PhError {
    fn from(e: toml::de::Error) -> Self {
        PhError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ph_error_display() {
        let err = PhError::Config("bad value".to_string());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn test_validation_display_joins_issues() {
        let err = PhError::Validation(vec!["author is required".into(), "consent is required".into()]);
        assert_eq!(
            err.to_string(),
            "validation failed: author is required; consent is required"
        );
    }

    #[test]
    fn test_error_families() {
        assert!(PhError::Timeout("slow".into()).is_network());
        assert!(PhError::ServerError { status: 503, message: String::new() }.is_network());
        assert!(!PhError::Decode("x".into()).is_network());
        assert!(PhError::StorageUnavailable("quota".into()).is_storage());
        assert!(!PhError::Network("down".into()).is_storage());
    }

    #[test]
    fn test_json_error_maps_to_decode() {
        let err: PhError = serde_json::from_str::<Vec<u8>>("{").unwrap_err().into();
        assert!(matches!(err, PhError::Decode(_)));
    }
}
