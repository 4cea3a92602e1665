use std::path::Path;

use rusqlite::{Connection, params};

use crate::error::AppError;
use crate::storage::kv::KeyValueStore;

/// Initialize the database schema. Uses CREATE TABLE IF NOT EXISTS so it's
/// safe to call on every startup.
pub fn init_db(conn: &Connection) -> Result<(), AppError> {
    conn.execute_batch("PRAGMA busy_timeout = 5000;")?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
        ",
    )?;

    Ok(())
}

/// SQLite-backed key/value store: one row per key in the `kv` table.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database at the given path and initialize the schema.
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let conn = Connection::open(path)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn upsert(conn: &Connection, key: &str, value: &str) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO kv (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
        params![key, value],
    )?;
    Ok(())
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        match self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            }) {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(other) => Err(AppError::Db(other)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        upsert(&self.conn, key, value)
    }

    /// All entries land in one transaction, so a summary is never half-written.
    fn set_many(&mut self, entries: &[(String, String)]) -> Result<(), AppError> {
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in entries {
            upsert(&tx, key, value)?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_missing_key_returns_none() {
        let store = SqliteStore::in_memory().unwrap();
        assert_eq!(store.get("nothing").unwrap(), None);
    }

    #[test]
    fn set_overwrites_existing_value() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.set("theme", "light").unwrap();
        store.set("theme", "dark").unwrap();

        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
        let rows: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM kv", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn get_returns_db_error_when_table_is_missing() {
        let store = SqliteStore {
            conn: Connection::open_in_memory().unwrap(),
        };
        let err = store.get("anything").unwrap_err();
        assert!(
            matches!(err, AppError::Db(_)),
            "expected Db error when table doesn't exist, got: {err:?}"
        );
    }

    /// A failing row in the middle of set_many must roll back the rows
    /// written before it.
    #[test]
    fn set_many_is_atomic() {
        let mut store = SqliteStore::in_memory().unwrap();
        store
            .conn()
            .execute_batch(
                "CREATE TRIGGER reject_marker
                 BEFORE INSERT ON kv
                 WHEN NEW.value = '__reject__'
                 BEGIN
                     SELECT RAISE(ABORT, 'forced write failure');
                 END;",
            )
            .unwrap();

        let result = store.set_many(&[
            ("quiz_a_attempts".into(), "1".into()),
            ("quiz_a_best".into(), "__reject__".into()),
        ]);
        assert!(result.is_err());
        assert_eq!(
            store.get("quiz_a_attempts").unwrap(),
            None,
            "first write must have been rolled back"
        );
    }

    #[test]
    fn values_survive_reopening_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("study.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.set("k", "persisted").unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("persisted"));
    }
}
