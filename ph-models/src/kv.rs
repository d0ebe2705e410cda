//! Key-value table for small client state.
//!
//! Holds the pending-submission queue, the story form draft, the first-visit
//! flag and background sync registrations. Values are TEXT; typed accessors
//! handle parsing.

use rusqlite::{params, Connection, OptionalExtension};

use ph_core::error::{PhError, PhResult};

/// Key-value store backed by the `kv_store` table.
pub struct KeyValue;

impl KeyValue {
    /// Get a raw string value for a key.
    pub fn get(conn: &Connection, key: &str) -> PhResult<Option<String>> {
        conn.query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
            row.get::<_, String>(0)
        })
        .optional()
        .map_err(|e| PhError::StorageUnavailable(e.to_string()))
    }

    /// Set a raw string value for a key (upsert).
    pub fn set(conn: &Connection, key: &str, value: &str) -> PhResult<()> {
        conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map_err(|e| PhError::StorageUnavailable(e.to_string()))?;
        Ok(())
    }

    /// Delete a key. Returns whether it existed.
    pub fn delete(conn: &Connection, key: &str) -> PhResult<bool> {
        let changed = conn
            .execute("DELETE FROM kv_store WHERE key = ?1", [key])
            .map_err(|e| PhError::StorageUnavailable(e.to_string()))?;
        Ok(changed > 0)
    }

    /// Get a boolean value (stored as "true"/"false").
    pub fn get_bool(conn: &Connection, key: &str) -> PhResult<Option<bool>> {
        Ok(Self::get(conn, key)?.map(|v| v == "true" || v == "1"))
    }

    pub fn set_bool(conn: &Connection, key: &str, value: bool) -> PhResult<()> {
        Self::set(conn, key, if value { "true" } else { "false" })
    }

    /// Get a JSON-deserialized value.
    pub fn get_json<T: serde::de::DeserializeOwned>(
        conn: &Connection,
        key: &str,
    ) -> PhResult<Option<T>> {
        match Self::get(conn, key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Set a JSON-serialized value.
    pub fn set_json<T: serde::Serialize>(conn: &Connection, key: &str, value: &T) -> PhResult<()> {
        let raw = serde_json::to_string(value)?;
        Self::set(conn, key, &raw)
    }
}
