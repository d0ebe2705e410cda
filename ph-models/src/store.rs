//! Best-effort handle to local storage.
//!
//! `LocalStore` is what services hold. When the database cannot be opened
//! (permissions, full disk, corrupt file) the store is `Unavailable` and
//! every call returns `PhError::StorageUnavailable`. Callers log that and
//! carry on without persistence.

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use ph_core::config::DatabaseConfig;
use ph_core::error::{PhError, PhResult};

use crate::collection::Record;
use crate::content_store;
use crate::db::{Database, DatabaseStats};
use crate::kv::KeyValue;
use crate::models::record_id::RecordId;

#[derive(Clone)]
enum Backend {
    Sqlite(Database),
    Unavailable(Arc<str>),
}

/// Local content store plus key-value state.
#[derive(Clone)]
pub struct LocalStore {
    backend: Backend,
}

impl LocalStore {
    /// Open the store, degrading to unavailable instead of failing.
    pub fn open(path: &Path, config: &DatabaseConfig) -> Self {
        match Database::init(path, config) {
            Ok(db) => Self::from_database(db),
            Err(e) => {
                warn!("local storage unavailable, continuing without persistence: {e}");
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn from_database(db: Database) -> Self {
        Self {
            backend: Backend::Sqlite(db),
        }
    }

    /// A store that refuses every operation.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        let reason: String = reason.into();
        Self {
            backend: Backend::Unavailable(Arc::from(reason)),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.backend, Backend::Sqlite(_))
    }

    /// Why the store is unavailable, if it is.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.backend {
            Backend::Sqlite(_) => None,
            Backend::Unavailable(reason) => Some(reason),
        }
    }

    pub fn database(&self) -> PhResult<&Database> {
        match &self.backend {
            Backend::Sqlite(db) => Ok(db),
            Backend::Unavailable(reason) => Err(PhError::StorageUnavailable(reason.to_string())),
        }
    }

    /// Upsert a whole collection in one transaction.
    pub fn mirror<R: Record>(&self, items: &[R]) -> PhResult<usize> {
        self.database()?
            .transaction(|conn| content_store::mirror(conn, items))
    }

    pub fn put<R: Record>(&self, item: &R) -> PhResult<()> {
        let conn = self.database()?.conn()?;
        content_store::put(&conn, item)
    }

    pub fn load_all<R: Record>(&self) -> PhResult<Vec<R>> {
        let conn = self.database()?.conn()?;
        content_store::load_all(&conn)
    }

    pub fn get<R: Record>(&self, id: &RecordId) -> PhResult<Option<R>> {
        let conn = self.database()?.conn()?;
        content_store::get(&conn, id)
    }

    pub fn kv_get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> PhResult<Option<T>> {
        let conn = self.database()?.conn()?;
        KeyValue::get_json(&conn, key)
    }

    pub fn kv_set_json<T: serde::Serialize>(&self, key: &str, value: &T) -> PhResult<()> {
        let conn = self.database()?.conn()?;
        KeyValue::set_json(&conn, key, value)
    }

    pub fn kv_get_bool(&self, key: &str) -> PhResult<Option<bool>> {
        let conn = self.database()?.conn()?;
        KeyValue::get_bool(&conn, key)
    }

    pub fn kv_set_bool(&self, key: &str, value: bool) -> PhResult<()> {
        let conn = self.database()?.conn()?;
        KeyValue::set_bool(&conn, key, value)
    }

    pub fn kv_delete(&self, key: &str) -> PhResult<bool> {
        let conn = self.database()?.conn()?;
        KeyValue::delete(&conn, key)
    }

    pub fn stats(&self) -> PhResult<DatabaseStats> {
        self.database()?.stats()
    }
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.backend {
            Backend::Sqlite(_) => f.write_str("LocalStore(sqlite)"),
            Backend::Unavailable(reason) => write!(f, "LocalStore(unavailable: {reason})"),
        }
    }
}
