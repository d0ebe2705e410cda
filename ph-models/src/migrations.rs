//! Versioned schema setup.
//!
//! Migrations run sequentially from the stored version up to
//! `DB_SCHEMA_VERSION`, all inside one transaction, so a store is either
//! fully set up for a version or not at all. Opening a store that is already
//! at the current version applies nothing.

use rusqlite::Connection;
use tracing::{info, warn};

use ph_core::constants::DB_SCHEMA_VERSION;
use ph_core::error::{PhError, PhResult};

use crate::schema;

/// Apply all pending migrations. Returns how many were applied.
pub fn run_migrations(conn: &Connection) -> PhResult<usize> {
    schema::create_version_table(conn)?;
    let current_version = get_schema_version(conn)?;

    if current_version >= DB_SCHEMA_VERSION {
        info!("database schema is up to date (version {current_version})");
        return Ok(0);
    }

    info!("running migrations from version {current_version} to {DB_SCHEMA_VERSION}");

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| PhError::Migration(e.to_string()))?;

    let mut applied = 0;
    for version in (current_version + 1)..=DB_SCHEMA_VERSION {
        run_migration(&tx, version)?;
        applied += 1;
    }
    set_schema_version(&tx, DB_SCHEMA_VERSION)?;

    tx.commit().map_err(|e| PhError::Migration(e.to_string()))?;

    info!("migrations complete, schema at version {DB_SCHEMA_VERSION}");
    Ok(applied)
}

/// Get the current schema version, recording 0 on first open.
pub fn get_schema_version(conn: &Connection) -> PhResult<i32> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .map_err(|e| PhError::StorageUnavailable(e.to_string()))?;

    if count == 0 {
        conn.execute("INSERT INTO schema_version (version) VALUES (0)", [])
            .map_err(|e| PhError::StorageUnavailable(e.to_string()))?;
        return Ok(0);
    }

    conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
        row.get(0)
    })
    .map_err(|e| PhError::StorageUnavailable(e.to_string()))
}

fn set_schema_version(conn: &Connection, version: i32) -> PhResult<()> {
    conn.execute("UPDATE schema_version SET version = ?1", [version])
        .map_err(|e| PhError::Migration(e.to_string()))?;
    Ok(())
}

fn run_migration(conn: &Connection, version: i32) -> PhResult<()> {
    info!("applying migration version {version}");

    match version {
        1 => migration_v1(conn),
        _ => {
            warn!("unknown migration version {version}, skipping");
            Ok(())
        }
    }
}

/// v1: the three content collections and the key-value table.
fn migration_v1(conn: &Connection) -> PhResult<()> {
    for table in schema::COLLECTION_TABLES {
        schema::create_collection_table(conn, table)?;
    }
    schema::create_kv_table(conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_on_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        let applied = run_migrations(&conn).unwrap();
        assert_eq!(applied, DB_SCHEMA_VERSION as usize);
        assert_eq!(get_schema_version(&conn).unwrap(), DB_SCHEMA_VERSION);

        for table in schema::COLLECTION_TABLES {
            assert!(schema::table_exists(&conn, table).unwrap());
        }
        assert!(schema::table_exists(&conn, "kv_store").unwrap());
    }

    #[test]
    fn test_setup_runs_once_per_version() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(run_migrations(&conn).unwrap(), 1);
        assert_eq!(run_migrations(&conn).unwrap(), 0);
        assert_eq!(run_migrations(&conn).unwrap(), 0);
    }

    #[test]
    fn test_setup_reruns_after_version_reset() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute("UPDATE schema_version SET version = 0", []).unwrap();
        assert_eq!(run_migrations(&conn).unwrap(), 1);
    }
}
