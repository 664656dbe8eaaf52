// SQLite backend: a key-value table holding the serialized collection

use crate::storage::{Storage, TASKS_KEY};
use crate::task::Task;
use eyre::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CURRENT_VERSION: u32 = 1;
const VERSION_KEY: &str = "version";

/// Stores the collection as JSON under the `tasks` key of `<dir>/tasklist.db`
pub struct SqliteStorage {
    db_path: Option<PathBuf>,
    db: Connection,
}

impl SqliteStorage {
    /// Open or create the database in `dir`
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        // Create directory if it doesn't exist
        fs::create_dir_all(dir.as_ref()).context("Failed to create data directory")?;

        // Open SQLite database
        let db_path = dir.as_ref().join("tasklist.db");
        let db = Connection::open(&db_path).context("Failed to open SQLite database")?;

        let storage = Self {
            db_path: Some(db_path),
            db,
        };

        // Initialize schema and version key
        storage.init()?;

        Ok(storage)
    }

    /// Database that lives only as long as this value
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let storage = Self { db_path: None, db };
        storage.init()?;
        Ok(storage)
    }

    fn init(&self) -> Result<()> {
        debug!("Creating key-value schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;

        // Existing databases keep the version they were created with
        self.db.execute(
            "INSERT OR IGNORE INTO kv (key, value) VALUES (?1, ?2)",
            rusqlite::params![VERSION_KEY, CURRENT_VERSION.to_string()],
        )?;

        Ok(())
    }

    /// Raw value stored under `key`
    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }
}

impl Storage for SqliteStorage {
    fn load(&self) -> Result<Vec<Task>> {
        let Some(json) = self.get_raw(TASKS_KEY)? else {
            return Ok(Vec::new());
        };

        let tasks: Vec<Task> = serde_json::from_str(&json).context("Failed to deserialize stored tasks")?;
        info!(count = tasks.len(), "Loaded tasks from SQLite");
        Ok(tasks)
    }

    fn save(&mut self, tasks: &[Task]) -> Result<()> {
        let json = serde_json::to_string(tasks).context("Failed to serialize tasks")?;

        // Whole collection replaces the previous value in one transaction
        let tx = self.db.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            rusqlite::params![TASKS_KEY, json],
        )?;
        tx.commit()?;

        debug!(count = tasks.len(), "Saved tasks to SQLite");
        Ok(())
    }

    fn describe(&self) -> String {
        match self.db_path() {
            Some(path) => path.display().to_string(),
            None => ":memory:".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_database() {
        let temp = TempDir::new().unwrap();
        let storage = SqliteStorage::open(temp.path()).unwrap();

        assert!(temp.path().join("tasklist.db").exists());
        assert_eq!(storage.get_raw(VERSION_KEY).unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_load_empty_database() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let tasks = vec![
            Task::new(2, "Second".to_string(), Utc::now()),
            Task::new(1, "First".to_string(), Utc::now()),
        ];

        {
            let mut storage = SqliteStorage::open(temp.path()).unwrap();
            storage.save(&tasks).unwrap();
        }

        let storage = SqliteStorage::open(temp.path()).unwrap();
        assert_eq!(storage.load().unwrap(), tasks);
    }

    #[test]
    fn test_load_corrupt_value_errors() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage
            .db
            .execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                rusqlite::params![TASKS_KEY, "[{\"id\":"],
            )
            .unwrap();

        assert!(storage.load().is_err());
    }

    #[test]
    fn test_describe_in_memory() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        assert_eq!(storage.describe(), ":memory:");
        assert!(storage.db_path().is_none());
    }
}
