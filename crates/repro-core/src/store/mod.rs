//! SQLite local store
//!
//! The embedded database the client queries. Remote changes stream in
//! through [`ItemStore::apply`]; local mutations go through `insert` and
//! `delete_many`. A `find_many` returns whatever the database currently
//! holds, with no guarantee that a sync has completed.

mod error;
pub mod schema;

pub use error::{StoreError, StoreResult};

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::config::Config;
use crate::models::Item;
use crate::sync::message::RowChange;
use schema::{init_schema, needs_init};

/// Local store for the `items` table
pub struct ItemStore {
    conn: Connection,
}

impl ItemStore {
    /// Open or create the SQLite database at the configured path
    pub fn open(config: &Config) -> StoreResult<Self> {
        let path = config.sqlite_path();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        if needs_init(&conn) {
            init_schema(&conn)?;
        }

        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Query all local rows
    pub fn find_many(&self) -> StoreResult<Vec<Item>> {
        let mut stmt = self.conn.prepare("SELECT id, value FROM items")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (id, value) = row?;
            let id = Uuid::parse_str(&id).map_err(|e| StoreError::InvalidRow {
                table: "items".to_string(),
                details: e.to_string(),
            })?;
            items.push(Item::with_id(id, value));
        }

        Ok(items)
    }

    /// Insert one locally created row
    pub fn insert(&self, item: &Item) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO items (id, value) VALUES (?1, ?2)",
            params![item.id.to_string(), item.value],
        )?;
        Ok(())
    }

    /// Remove all rows, returning how many were deleted
    pub fn delete_many(&self) -> StoreResult<usize> {
        let deleted = self.conn.execute("DELETE FROM items", [])?;
        Ok(deleted)
    }

    /// Count local rows
    pub fn count(&self) -> StoreResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Apply a batch of remote row changes in one transaction
    ///
    /// Upserts overwrite any existing row with the same id, so a snapshot
    /// replayed by the service is idempotent.
    pub fn apply(&mut self, changes: &[RowChange]) -> StoreResult<usize> {
        let tx = self.conn.transaction()?;

        for change in changes {
            match change {
                RowChange::Upsert { row } => {
                    tx.execute(
                        "INSERT OR REPLACE INTO items (id, value) VALUES (?1, ?2)",
                        params![row.id.to_string(), row.value],
                    )?;
                }
                RowChange::Delete { id } => {
                    tx.execute(
                        "DELETE FROM items WHERE id = ?1",
                        params![id.to_string()],
                    )?;
                }
            }
        }

        tx.commit()?;
        Ok(changes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_find() {
        let store = ItemStore::open_in_memory().unwrap();

        let item = Item::new();
        store.insert(&item).unwrap();

        let items = store.find_many().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0], item);
    }

    #[test]
    fn test_find_many_empty() {
        let store = ItemStore::open_in_memory().unwrap();
        assert!(store.find_many().unwrap().is_empty());
    }

    #[test]
    fn test_delete_many() {
        let store = ItemStore::open_in_memory().unwrap();

        store.insert(&Item::new()).unwrap();
        store.insert(&Item::new()).unwrap();
        assert_eq!(store.count().unwrap(), 2);

        let deleted = store.delete_many().unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.find_many().unwrap().is_empty());
    }

    #[test]
    fn test_apply_upsert_and_delete() {
        let mut store = ItemStore::open_in_memory().unwrap();

        let a = Item::with_value("a");
        let b = Item::with_value("b");
        store
            .apply(&[
                RowChange::Upsert { row: a.clone() },
                RowChange::Upsert { row: b.clone() },
            ])
            .unwrap();
        assert_eq!(store.count().unwrap(), 2);

        // Upsert with the same id overwrites
        let a2 = Item::with_id(a.id, "a-updated");
        store.apply(&[RowChange::Upsert { row: a2.clone() }]).unwrap();
        let items = store.find_many().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.contains(&a2));

        store.apply(&[RowChange::Delete { id: b.id }]).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_open_persists_across_reopens() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            service_url: None,
            client_debug: false,
        };

        let item = Item::new();
        {
            let store = ItemStore::open(&config).unwrap();
            store.insert(&item).unwrap();
        }

        let store = ItemStore::open(&config).unwrap();
        let items = store.find_many().unwrap();
        assert_eq!(items, vec![item]);
        assert!(config.sqlite_path().exists());
    }
}
