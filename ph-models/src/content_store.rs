//! Collection reads and writes.
//!
//! Each record is stored as its JSON body keyed by id. Writes are upserts:
//! the last write for an id wins. Callers wanting all-or-nothing semantics
//! for a batch run `mirror` inside `Database::transaction`.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use ph_core::error::{PhError, PhResult};

use crate::collection::Record;
use crate::models::record_id::RecordId;

fn storage_err(e: rusqlite::Error) -> PhError {
    PhError::StorageUnavailable(e.to_string())
}

/// Insert or overwrite one record.
pub fn put<R: Record>(conn: &Connection, item: &R) -> PhResult<()> {
    let table = R::COLLECTION.table();
    let body = serde_json::to_string(item)?;
    let sql = format!(
        "INSERT INTO {table} (id, body, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at"
    );
    conn.execute(
        &sql,
        params![item.record_id().as_str(), body, Utc::now().to_rfc3339()],
    )
    .map_err(storage_err)?;
    Ok(())
}

/// Upsert every item by id. Returns the number written.
pub fn mirror<R: Record>(conn: &Connection, items: &[R]) -> PhResult<usize> {
    for item in items {
        put(conn, item)?;
    }
    debug!("mirrored {} records into {}", items.len(), R::COLLECTION);
    Ok(items.len())
}

/// Every record in the collection, in no particular order.
///
/// Rows whose body no longer decodes as `R` are skipped with a warning.
pub fn load_all<R: Record>(conn: &Connection) -> PhResult<Vec<R>> {
    let table = R::COLLECTION.table();
    let mut stmt = conn
        .prepare(&format!("SELECT id, body FROM {table}"))
        .map_err(storage_err)?;

    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
        .map_err(storage_err)?;

    let mut items = Vec::new();
    for row in rows {
        let (id, body) = row.map_err(storage_err)?;
        match serde_json::from_str::<R>(&body) {
            Ok(item) => items.push(item),
            Err(e) => warn!("skipping undecodable {table} record {id}: {e}"),
        }
    }
    Ok(items)
}

/// One record by id.
pub fn get<R: Record>(conn: &Connection, id: &RecordId) -> PhResult<Option<R>> {
    let table = R::COLLECTION.table();
    let body: Option<String> = conn
        .query_row(
            &format!("SELECT body FROM {table} WHERE id = ?1"),
            [id.as_str()],
            |row| row.get(0),
        )
        .optional()
        .map_err(storage_err)?;

    match body {
        Some(body) => Ok(Some(serde_json::from_str(&body)?)),
        None => Ok(None),
    }
}

/// Number of records in the collection.
pub fn count<R: Record>(conn: &Connection) -> PhResult<i64> {
    let table = R::COLLECTION.table();
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .map_err(storage_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;
    use crate::models::story::{Story, StoryStatus};
    use crate::models::timeline_event::TimelineEvent;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn event(id: i64, year: i32, title: &str) -> TimelineEvent {
        serde_json::from_value(serde_json::json!({
            "id": id, "year": year, "title": title
        }))
        .unwrap()
    }

    #[test]
    fn test_mirror_then_load_is_last_write_per_id() {
        let conn = conn();
        mirror(&conn, &[event(1, 1930, "a"), event(2, 1940, "b")]).unwrap();
        mirror(&conn, &[event(2, 1945, "b2"), event(3, 1950, "c")]).unwrap();

        let mut all: Vec<TimelineEvent> = load_all(&conn).unwrap();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].title, "b2");
        assert_eq!(all[1].year, 1945);
        assert_eq!(count::<TimelineEvent>(&conn).unwrap(), 3);
    }

    #[test]
    fn test_put_and_get_story() {
        let conn = conn();
        let mut story: Story = serde_json::from_value(serde_json::json!({
            "id": "offline_1", "author": "a", "kindergarten": "k",
            "text": "t", "status": "offline"
        }))
        .unwrap();
        put(&conn, &story).unwrap();

        story.status = StoryStatus::Published;
        put(&conn, &story).unwrap();

        let loaded: Story = get(&conn, &story.id).unwrap().unwrap();
        assert_eq!(loaded.status, StoryStatus::Published);
        assert!(get::<Story>(&conn, &RecordId::from("missing")).unwrap().is_none());
    }

    #[test]
    fn test_undecodable_rows_are_skipped() {
        let conn = conn();
        mirror(&conn, &[event(1, 1930, "a")]).unwrap();
        conn.execute(
            "INSERT INTO timeline (id, body, updated_at) VALUES ('bad', '{}', '')",
            [],
        )
        .unwrap();
        let all: Vec<TimelineEvent> = load_all(&conn).unwrap();
        assert_eq!(all.len(), 1);
    }
}
