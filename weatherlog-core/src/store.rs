//! Request history persisted in a single SQLite table.
//!
//! Every operation opens its own connection and releases it before returning;
//! writes run inside a transaction so a failure leaves nothing half-applied.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use rusqlite::{Connection, Row, params, types::Type};
use thiserror::Error;

use crate::model::WeatherRequestRecord;

pub const TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS weather_requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    location TEXT NOT NULL,
    date TEXT NOT NULL,
    temperature TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#;

const DROP_TABLE: &str = "DROP TABLE IF EXISTS weather_requests;";

/// Format SQLite uses for `CURRENT_TIMESTAMP`.
const SQLITE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No history record with id {0}")]
    NotFound(i64),

    #[error("History store unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// CRUD over past weather requests. Identifiers and `created_at` are always
/// assigned by the store.
pub trait RequestHistoryStore: Send + Sync {
    fn create(&self, location: &str, date: &str, temperature: &str) -> Result<i64, StoreError>;

    /// All records in the table's natural order.
    fn read_all(&self) -> Result<Vec<WeatherRequestRecord>, StoreError>;

    fn read_by_id(&self, id: i64) -> Result<WeatherRequestRecord, StoreError>;

    /// Replace the temperature; nothing else about a record is mutable.
    fn update(&self, id: i64, temperature: &str) -> Result<(), StoreError>;

    fn delete(&self, id: i64) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct SqliteHistoryStore {
    path: PathBuf,
}

impl SqliteHistoryStore {
    /// Open (or create) the database at `path`. With `reset` the table is
    /// dropped and recreated empty.
    pub fn open(path: impl Into<PathBuf>, reset: bool) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!(
                    "failed to create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let store = Self { path };
        let mut conn = store.connect()?;
        let tx = conn.transaction()?;
        if reset {
            tracing::warn!("Resetting request history at {}", store.path.display());
            tx.execute_batch(DROP_TABLE)?;
        }
        tx.execute_batch(TABLE_SCHEMA)?;
        tx.commit()?;

        tracing::info!("History store ready at {}", store.path.display());
        Ok(store)
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Connection::open(&self.path).map_err(|e| {
            StoreError::Unavailable(format!("failed to open {}: {e}", self.path.display()))
        })
    }
}

fn row_to_record(row: &Row) -> rusqlite::Result<WeatherRequestRecord> {
    let created_at: String = row.get("created_at")?;
    let created_at = NaiveDateTime::parse_from_str(&created_at, SQLITE_TIMESTAMP)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(WeatherRequestRecord {
        id: row.get("id")?,
        location: row.get("location")?,
        date: row.get("date")?,
        temperature: row.get("temperature")?,
        created_at,
    })
}

impl RequestHistoryStore for SqliteHistoryStore {
    fn create(&self, location: &str, date: &str, temperature: &str) -> Result<i64, StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO weather_requests (location, date, temperature) VALUES (?1, ?2, ?3)",
            params![location, date, temperature],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!(id, location, date, temperature, "history record created");
        Ok(id)
    }

    fn read_all(&self) -> Result<Vec<WeatherRequestRecord>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, location, date, temperature, created_at FROM weather_requests",
        )?;
        let records = stmt.query_map([], row_to_record)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn read_by_id(&self, id: i64) -> Result<WeatherRequestRecord, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, location, date, temperature, created_at
             FROM weather_requests
             WHERE id = ?1",
        )?;
        let mut rows = stmt.query(params![id])?;
        let record = match rows.next()? {
            Some(row) => row_to_record(row)?,
            None => return Err(StoreError::NotFound(id)),
        };
        Ok(record)
    }

    fn update(&self, id: i64, temperature: &str) -> Result<(), StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let rows_affected = tx.execute(
            "UPDATE weather_requests SET temperature = ?1 WHERE id = ?2",
            params![temperature, id],
        )?;
        if rows_affected == 0 {
            return Err(StoreError::NotFound(id));
        }
        tx.commit()?;

        tracing::debug!(id, temperature, "history record updated");
        Ok(())
    }

    fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let rows_affected = tx.execute("DELETE FROM weather_requests WHERE id = ?1", params![id])?;
        if rows_affected == 0 {
            return Err(StoreError::NotFound(id));
        }
        tx.commit()?;

        tracing::debug!(id, "history record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, SqliteHistoryStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SqliteHistoryStore::open(dir.path().join("history.db"), false).expect("open");
        (dir, store)
    }

    #[test]
    fn create_and_read_back() {
        let (_dir, store) = open_store();

        let id = store.create("Paris, France", "2024-01-01", "45.1°F").unwrap();
        let record = store.read_by_id(id).unwrap();

        assert_eq!(record.id, id);
        assert_eq!(record.location, "Paris, France");
        assert_eq!(record.date, "2024-01-01");
        assert_eq!(record.temperature, "45.1°F");
    }

    #[test]
    fn read_all_counts_creates_minus_deletes() {
        let (_dir, store) = open_store();

        let ids: Vec<i64> = (0..5)
            .map(|i| store.create("Oslo, Norway", &format!("2024-01-0{}", i + 1), "20°F").unwrap())
            .collect();
        store.delete(ids[1]).unwrap();
        store.delete(ids[3]).unwrap();

        let records = store.read_all().unwrap();
        assert_eq!(records.len(), 3);

        let read_ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(read_ids, [ids[0], ids[2], ids[4]]);
    }

    #[test]
    fn ids_are_unique_and_never_reused() {
        let (_dir, store) = open_store();

        let first = store.create("A, B", "2024-01-01", "1°F").unwrap();
        let second = store.create("A, B", "2024-01-01", "1°F").unwrap();
        store.delete(second).unwrap();
        let third = store.create("A, B", "2024-01-01", "1°F").unwrap();

        assert!(first < second);
        assert!(second < third);
    }

    #[test]
    fn update_changes_only_temperature() {
        let (_dir, store) = open_store();

        let id = store.create("Lima, Peru", "2024-02-02", "70°F").unwrap();
        let before = store.read_by_id(id).unwrap();

        store.update(id, "75°F").unwrap();
        let after = store.read_by_id(id).unwrap();

        assert_eq!(after.temperature, "75°F");
        assert_eq!(after.id, before.id);
        assert_eq!(after.location, before.location);
        assert_eq!(after.date, before.date);
        assert_eq!(after.created_at, before.created_at);
    }

    #[test]
    fn missing_ids_are_not_found() {
        let (_dir, store) = open_store();

        assert!(matches!(store.read_by_id(42), Err(StoreError::NotFound(42))));
        assert!(matches!(store.update(42, "1°F"), Err(StoreError::NotFound(42))));
        assert!(matches!(store.delete(42), Err(StoreError::NotFound(42))));
    }

    #[test]
    fn delete_twice_is_not_found() {
        let (_dir, store) = open_store();

        let id = store.create("Cairo, Egypt", "2024-03-03", "90°F").unwrap();
        store.delete(id).unwrap();

        assert!(matches!(store.read_by_id(id), Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete(id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn history_survives_reopen_unless_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");

        let store = SqliteHistoryStore::open(&path, false).unwrap();
        store.create("Rome, Italy", "2024-04-04", "60°F").unwrap();

        let reopened = SqliteHistoryStore::open(&path, false).unwrap();
        assert_eq!(reopened.read_all().unwrap().len(), 1);

        let reset = SqliteHistoryStore::open(&path, true).unwrap();
        assert!(reset.read_all().unwrap().is_empty());
    }

    #[test]
    fn unreachable_database_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteHistoryStore { path: dir.path().join("missing").join("history.db") };

        assert!(matches!(store.read_all(), Err(StoreError::Unavailable(_))));
    }
}
