//! SQLite implementation of the species store.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::traits::SpeciesStore;
use crate::species::SpeciesRecord;

/// SQLite-based species store.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open or create the store at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;
    Self::open_at(&path)
  }

  /// Open or create the store at `path`.
  pub fn open_at(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// Open a throwaway store that lives only as long as this value.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;

    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;
    Ok(store)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("bioguardian").join("bio_guardian.db"))
  }

  /// Run database migrations for cache tables.
  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }

  /// Total number of cached records across all categories.
  pub fn count(&self) -> Result<usize> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let count: i64 = conn
      .query_row("SELECT COUNT(*) FROM endangered_animals", [], |row| {
        row.get(0)
      })
      .map_err(|e| eyre!("Failed to count cached species: {}", e))?;

    Ok(count as usize)
  }
}

/// Schema for the species table.
///
/// `position` keeps the order in which a batch was written so reads return
/// records in the order the remote source listed them.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS endangered_animals (
    id INTEGER PRIMARY KEY,
    animal_name TEXT,
    animal_type TEXT,
    biological_name TEXT,
    conservation_status TEXT,
    image_url TEXT,
    created_at TEXT,
    updated_at TEXT,
    last_fetched INTEGER NOT NULL,
    position INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_endangered_animals_type
    ON endangered_animals(animal_type);
"#;

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<SpeciesRecord> {
  Ok(SpeciesRecord {
    id: row.get(0)?,
    name: row.get(1)?,
    category: row.get(2)?,
    scientific_name: row.get(3)?,
    conservation_status: row.get(4)?,
    image_url: row.get(5)?,
    created_at: row.get(6)?,
    updated_at: row.get(7)?,
    last_fetched: row.get(8)?,
  })
}

impl SpeciesStore for SqliteStore {
  fn query_by_category(&self, category: &str) -> Result<Vec<SpeciesRecord>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare(
        "SELECT id, animal_name, animal_type, biological_name, conservation_status,
                image_url, created_at, updated_at, last_fetched
         FROM endangered_animals
         WHERE animal_type = ?
         ORDER BY position, id",
      )
      .map_err(|e| eyre!("Failed to prepare species query: {}", e))?;

    let records = stmt
      .query_map(params![category], record_from_row)
      .map_err(|e| eyre!("Failed to query species: {}", e))?
      .collect::<rusqlite::Result<Vec<_>>>()
      .map_err(|e| eyre!("Failed to read species row: {}", e))?;

    Ok(records)
  }

  fn replace_category(&self, category: &str, records: &[SpeciesRecord]) -> Result<()> {
    let mut conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    // Dropping the transaction without commit rolls back
    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    tx.execute(
      "DELETE FROM endangered_animals WHERE animal_type = ?",
      params![category],
    )
    .map_err(|e| eyre!("Failed to delete cached species for {}: {}", category, e))?;

    {
      let mut stmt = tx
        .prepare(
          "INSERT OR REPLACE INTO endangered_animals
             (id, animal_name, animal_type, biological_name, conservation_status,
              image_url, created_at, updated_at, last_fetched, position)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .map_err(|e| eyre!("Failed to prepare species insert: {}", e))?;

      for (position, record) in records.iter().enumerate() {
        stmt
          .execute(params![
            record.id,
            record.name,
            record.category,
            record.scientific_name,
            record.conservation_status,
            record.image_url,
            record.created_at,
            record.updated_at,
            record.last_fetched,
            position as i64,
          ])
          .map_err(|e| eyre!("Failed to store species {}: {}", record.id, e))?;
      }
    }

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn record(id: i64, name: &str, category: &str, last_fetched: i64) -> SpeciesRecord {
    SpeciesRecord {
      id,
      name: Some(name.to_string()),
      category: Some(category.to_string()),
      scientific_name: None,
      conservation_status: Some("Endangered".to_string()),
      image_url: None,
      created_at: None,
      updated_at: None,
      last_fetched,
    }
  }

  #[test]
  fn test_empty_category_returns_empty_list() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert!(store.query_by_category("Mammals").unwrap().is_empty());
  }

  #[test]
  fn test_replace_then_query() {
    let store = SqliteStore::open_in_memory().unwrap();
    let records = vec![record(2, "Tiger", "Mammals", 10), record(1, "Lynx", "Mammals", 10)];

    store.replace_category("Mammals", &records).unwrap();

    // Insertion order is preserved, not id order
    assert_eq!(store.query_by_category("Mammals").unwrap(), records);
  }

  #[test]
  fn test_query_is_case_sensitive() {
    let store = SqliteStore::open_in_memory().unwrap();
    store
      .replace_category("Mammals", &[record(1, "Tiger", "Mammals", 10)])
      .unwrap();

    assert!(store.query_by_category("mammals").unwrap().is_empty());
    assert_eq!(store.query_by_category("Mammals").unwrap().len(), 1);
  }

  #[test]
  fn test_replace_removes_old_records_of_category_only() {
    let store = SqliteStore::open_in_memory().unwrap();
    store
      .replace_category(
        "Mammals",
        &[record(1, "Tiger", "Mammals", 10), record(2, "Lynx", "Mammals", 10)],
      )
      .unwrap();
    store
      .replace_category("Birds", &[record(3, "Kakapo", "Birds", 10)])
      .unwrap();

    store
      .replace_category("Mammals", &[record(4, "Pangolin", "Mammals", 20)])
      .unwrap();

    let mammals = store.query_by_category("Mammals").unwrap();
    assert_eq!(mammals.len(), 1);
    assert_eq!(mammals[0].id, 4);
    assert_eq!(store.query_by_category("Birds").unwrap().len(), 1);
  }

  #[test]
  fn test_replace_with_empty_clears_category() {
    let store = SqliteStore::open_in_memory().unwrap();
    store
      .replace_category("Birds", &[record(3, "Kakapo", "Birds", 10)])
      .unwrap();

    store.replace_category("Birds", &[]).unwrap();

    assert!(store.query_by_category("Birds").unwrap().is_empty());
    assert_eq!(store.count().unwrap(), 0);
  }

  #[test]
  fn test_existing_id_is_replaced_in_full() {
    let store = SqliteStore::open_in_memory().unwrap();
    store
      .replace_category("Birds", &[record(1, "Kakapo", "Birds", 10)])
      .unwrap();

    // Same id arriving under another category moves the row
    store
      .replace_category("Mammals", &[record(1, "Tiger", "Mammals", 20)])
      .unwrap();

    assert!(store.query_by_category("Birds").unwrap().is_empty());
    let mammals = store.query_by_category("Mammals").unwrap();
    assert_eq!(mammals, vec![record(1, "Tiger", "Mammals", 20)]);
    assert_eq!(store.count().unwrap(), 1);
  }

  #[test]
  fn test_persists_across_reopen() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("cache.db");

    {
      let store = SqliteStore::open_at(&path).unwrap();
      store
        .replace_category("Mammals", &[record(1, "Tiger", "Mammals", 10)])
        .unwrap();
    }

    let reopened = SqliteStore::open_at(&path).unwrap();
    assert_eq!(
      reopened.query_by_category("Mammals").unwrap(),
      vec![record(1, "Tiger", "Mammals", 10)]
    );
  }
}
