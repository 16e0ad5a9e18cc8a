//! SQLite-backed document storage.
//!
//! The whole [`AppData`] document is stored as JSON text in a key-value
//! table, one row per storage key.

use rusqlite::{params, Connection};
use std::path::Path;

use super::{data_dir, Persistence};
use crate::error::StorageError;
use crate::model::AppData;

/// SQLite database holding the persisted document.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data dir>/smartcart.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        Self::open_at(&data_dir()?.join("smartcart.db"))
    }

    /// Open (or create) the database at `path`.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at)
             VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
            params![key, value],
        )?;
        Ok(())
    }
}

impl Persistence for Database {
    fn load(&self, key: &str) -> Result<Option<AppData>, StorageError> {
        let Some(raw) = self.kv_get(key)? else {
            return Ok(None);
        };
        let data = serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        Ok(Some(data))
    }

    fn save(&self, key: &str, data: &AppData) -> Result<(), StorageError> {
        let raw = serde_json::to_string(data).map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        self.kv_set(key, &raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, ListItem, PantryItem, ShoppingList};
    use chrono::{TimeZone, Utc};

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_set("test", "again").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "again");
    }

    #[test]
    fn document_round_trips_exactly() {
        let db = Database::open_memory().unwrap();
        let bought = Utc.with_ymd_and_hms(2025, 6, 1, 8, 15, 30).unwrap()
            + chrono::TimeDelta::milliseconds(250);
        let mut item = ListItem::new("i1", "Greek Yogurt", Category::DairyEggs);
        item.purchase_history = vec![bought];
        let data = AppData {
            lists: vec![ShoppingList {
                id: "l1".into(),
                name: "Groceries".into(),
                items: vec![item],
                created_at: bought,
            }],
            pantry: vec![PantryItem {
                id: "i1".into(),
                name: "Greek Yogurt".into(),
                category: Category::DairyEggs,
                purchase_date: bought,
                estimated_lifespan_days: 14,
            }],
            ..AppData::default()
        };

        db.save("smartcart-data", &data).unwrap();
        assert_eq!(db.load("smartcart-data").unwrap(), Some(data));
        assert!(db.load("other-key").unwrap().is_none());
    }

    #[test]
    fn corrupt_document_is_reported() {
        let db = Database::open_memory().unwrap();
        db.kv_set("smartcart-data", "{not json").unwrap();
        assert!(matches!(
            db.load("smartcart-data"),
            Err(StorageError::Corrupt { .. })
        ));
    }

    #[test]
    fn reopening_file_keeps_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smartcart.db");
        let mut data = AppData::default();
        data.settings.default_lifespan = 3;
        Database::open_at(&path).unwrap().save("k", &data).unwrap();
        let loaded = Database::open_at(&path).unwrap().load("k").unwrap();
        assert_eq!(loaded, Some(data));
    }
}
