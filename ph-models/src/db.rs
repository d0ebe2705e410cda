//! Database initialization, connection pooling, and lifecycle management.
//!
//! SQLite (optionally in WAL mode) behind an r2d2 pool. `init` finishes the
//! schema setup for the current version before returning, so no caller can
//! read or write a collection that does not exist yet.

use std::path::Path;
use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{error, info, warn};

use ph_core::config::DatabaseConfig;
use ph_core::constants::DB_NAME;
use ph_core::error::{PhError, PhResult};

use crate::collection::Collection;
use crate::content_store;
use crate::migrations;
use crate::models::benefit::Benefit;
use crate::models::story::Story;
use crate::models::timeline_event::TimelineEvent;
use crate::schema;

/// Type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Shared handle to the embedded content database.
#[derive(Clone)]
pub struct Database {
    pool: Arc<DbPool>,
}

impl Database {
    /// Open (creating if needed) the database at `db_path`.
    pub fn init(db_path: &Path, config: &DatabaseConfig) -> PhResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PhError::StorageUnavailable(format!("{}: {e}", parent.display())))?;
        }

        info!("opening {DB_NAME} at {}", db_path.display());

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(config.pool_size.max(1))
            .connection_customizer(Box::new(ConnectionCustomizer {
                wal_mode: config.wal_mode,
            }))
            .build(manager)
            .map_err(|e| PhError::Pool(e.to_string()))?;

        let db = Self {
            pool: Arc::new(pool),
        };

        if config.integrity_check_on_startup {
            db.run_integrity_check()?;
        }

        {
            let conn = db.conn()?;
            migrations::run_migrations(&conn)?;
        }

        info!("{DB_NAME} ready");
        Ok(db)
    }

    /// Get a connection from the pool.
    pub fn conn(&self) -> PhResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| PhError::Pool(e.to_string()))
    }

    /// Run a SQLite integrity check.
    pub fn run_integrity_check(&self) -> PhResult<()> {
        let conn = self.conn()?;
        let result: String = conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))
            .map_err(|e| PhError::StorageUnavailable(e.to_string()))?;

        if result != "ok" {
            error!("database integrity check failed: {result}");
            return Err(PhError::IntegrityCheck(result));
        }

        info!("database integrity check passed");
        Ok(())
    }

    /// Execute a function within a database transaction.
    pub fn transaction<T, F>(&self, f: F) -> PhResult<T>
    where
        F: FnOnce(&Connection) -> PhResult<T>,
    {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| PhError::StorageUnavailable(e.to_string()))?;

        let result = f(&tx)?;

        tx.commit()
            .map_err(|e| PhError::StorageUnavailable(e.to_string()))?;

        Ok(result)
    }

    /// Row counts per collection plus key-value entries.
    pub fn stats(&self) -> PhResult<DatabaseStats> {
        let conn = self.conn()?;

        let count = |table: &str| -> PhResult<i64> {
            let sql = format!("SELECT COUNT(*) FROM {table}");
            conn.query_row(&sql, [], |row| row.get(0))
                .map_err(|e| PhError::StorageUnavailable(e.to_string()))
        };

        Ok(DatabaseStats {
            schema_version: migrations::get_schema_version(&conn)?,
            timeline: content_store::count::<TimelineEvent>(&conn)?,
            stories: content_store::count::<Story>(&conn)?,
            benefits: content_store::count::<Benefit>(&conn)?,
            kv_entries: count("kv_store")?,
        })
    }

    /// Drop everything and set the schema up again.
    pub fn reset(&self) -> PhResult<()> {
        warn!("resetting {DB_NAME} - all local data will be lost");
        let conn = self.conn()?;
        schema::drop_tables(&conn)?;
        migrations::run_migrations(&conn)?;
        info!("database reset complete");
        Ok(())
    }
}

/// Database row count statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseStats {
    pub schema_version: i32,
    pub timeline: i64,
    pub stories: i64,
    pub benefits: i64,
    pub kv_entries: i64,
}

impl DatabaseStats {
    /// Record count for one collection.
    pub fn records(&self, collection: Collection) -> i64 {
        match collection {
            Collection::Timeline => self.timeline,
            Collection::Stories => self.stories,
            Collection::Benefits => self.benefits,
        }
    }
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "schema=v{}, timeline={}, stories={}, benefits={}, kv={}",
            self.schema_version, self.timeline, self.stories, self.benefits, self.kv_entries
        )
    }
}

/// r2d2 connection customizer that applies PRAGMA settings.
#[derive(Debug)]
struct ConnectionCustomizer {
    wal_mode: bool,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        if self.wal_mode {
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        }

        conn.execute_batch(
            "PRAGMA synchronous=NORMAL;
             PRAGMA temp_store=MEMORY;
             PRAGMA busy_timeout=5000;",
        )?;

        Ok(())
    }
}
