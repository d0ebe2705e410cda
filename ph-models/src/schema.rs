//! Database schema definitions.
//!
//! Only the version bookkeeping table is created unconditionally. The
//! collection tables are created by migrations so that setup runs once per
//! schema version (see `migrations`).

use rusqlite::Connection;
use tracing::info;

use ph_core::error::{PhError, PhResult};

/// Collection tables, in the order they are created.
pub const COLLECTION_TABLES: &[&str] = &["timeline", "stories", "benefits"];

/// Create the schema version table if it does not exist.
pub fn create_version_table(conn: &Connection) -> PhResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        );",
    )
    .map_err(|e| PhError::StorageUnavailable(format!("failed to create schema_version: {e}")))?;
    Ok(())
}

/// Create one collection table keyed by record id.
pub fn create_collection_table(conn: &Connection, table: &str) -> PhResult<()> {
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id          TEXT PRIMARY KEY NOT NULL,
            body        TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );"
    );
    conn.execute_batch(&sql)
        .map_err(|e| PhError::Migration(format!("failed to create {table}: {e}")))?;
    info!("created collection table {table}");
    Ok(())
}

/// Create the key-value table.
pub fn create_kv_table(conn: &Connection) -> PhResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key     TEXT PRIMARY KEY NOT NULL,
            value   TEXT NOT NULL
        );",
    )
    .map_err(|e| PhError::Migration(format!("failed to create kv_store: {e}")))?;
    Ok(())
}

/// Whether a table exists.
pub fn table_exists(conn: &Connection, table: &str) -> PhResult<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .map_err(|e| PhError::StorageUnavailable(e.to_string()))?;
    Ok(count > 0)
}

/// Drop every table (used for reset).
pub fn drop_tables(conn: &Connection) -> PhResult<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS timeline;
         DROP TABLE IF EXISTS stories;
         DROP TABLE IF EXISTS benefits;
         DROP TABLE IF EXISTS kv_store;
         DROP TABLE IF EXISTS schema_version;",
    )
    .map_err(|e| PhError::StorageUnavailable(format!("failed to drop tables: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_exists() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!table_exists(&conn, "kv_store").unwrap());
        create_kv_table(&conn).unwrap();
        assert!(table_exists(&conn, "kv_store").unwrap());
    }

    #[test]
    fn test_drop_tables() {
        let conn = Connection::open_in_memory().unwrap();
        create_version_table(&conn).unwrap();
        for table in COLLECTION_TABLES {
            create_collection_table(&conn, table).unwrap();
        }
        drop_tables(&conn).unwrap();
        assert!(!table_exists(&conn, "stories").unwrap());
        assert!(!table_exists(&conn, "schema_version").unwrap());
    }
}
