// JSON file backend: the whole collection in one document

use crate::storage::{Storage, TASKS_KEY};
use crate::task::Task;
use eyre::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Stores the collection as `<dir>/tasks.json`
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Backend rooted at `dir`; the directory is created on first save
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", TASKS_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("json.lock")
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl Storage for JsonFileStorage {
    fn load(&self) -> Result<Vec<Task>> {
        if !self.path.exists() {
            debug!(file = ?self.path, "No task file yet");
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).context("Failed to read task file")?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let tasks: Vec<Task> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse task file {}", self.path.display()))?;

        info!(file = ?self.path, count = tasks.len(), "Loaded tasks from JSON file");
        Ok(tasks)
    }

    fn save(&mut self, tasks: &[Task]) -> Result<()> {
        // Create data directory if it doesn't exist
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).context("Failed to create data directory")?;
        }

        // Acquire exclusive lock before writing
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())
            .context("Failed to open lock file")?;
        lock.lock_exclusive().context("Failed to acquire file lock")?;

        let json = serde_json::to_string_pretty(tasks).context("Failed to serialize tasks")?;

        // Write to a sibling file, then swap it in
        let tmp = self.tmp_path();
        let mut file = File::create(&tmp).context("Failed to create temporary task file")?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?; // Ensure data is flushed before the rename
        fs::rename(&tmp, &self.path).context("Failed to replace task file")?;

        debug!(file = ?self.path, count = tasks.len(), "Saved tasks to JSON file");

        // Lock is released when `lock` is dropped
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn sample() -> Vec<Task> {
        let mut done = Task::new(2, "Write report".to_string(), Utc::now());
        done.toggle(Utc::now());
        vec![done, Task::new(1, "Buy milk".to_string(), Utc::now())]
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(temp.path());
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let mut storage = JsonFileStorage::new(temp.path().join("nested"));
        let tasks = sample();

        storage.save(&tasks).unwrap();
        assert!(storage.path().exists());
        assert!(!storage.tmp_path().exists());

        let loaded = storage.load().unwrap();
        assert_eq!(loaded, tasks);
    }

    #[test]
    fn test_save_replaces_previous_collection() {
        let temp = TempDir::new().unwrap();
        let mut storage = JsonFileStorage::new(temp.path());

        storage.save(&sample()).unwrap();
        storage.save(&sample()[1..]).unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].text, "Buy milk");
    }

    #[test]
    fn test_load_corrupt_file_errors() {
        let temp = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(temp.path());
        fs::write(storage.path(), "{not json").unwrap();

        assert!(storage.load().is_err());
    }

    #[test]
    fn test_load_blank_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(temp.path());
        fs::write(storage.path(), "\n").unwrap();

        assert!(storage.load().unwrap().is_empty());
    }
}
