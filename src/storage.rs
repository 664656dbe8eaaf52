// Persistence interface for the task collection

use crate::task::Task;
use eyre::{Result, eyre};

/// Key under which backends keep the serialized collection
pub const TASKS_KEY: &str = "tasks";

/// Whole-collection persistence used by `TaskStore`
///
/// Backends always read and write the full collection; there is no
/// incremental update. `load` returns an empty vector when nothing has been
/// stored yet and an error when stored data cannot be decoded.
pub trait Storage {
    /// Read the stored collection, newest first
    fn load(&self) -> Result<Vec<Task>>;

    /// Replace the stored collection
    fn save(&mut self, tasks: &[Task]) -> Result<()>;

    /// Human-readable location, used in log lines
    fn describe(&self) -> String {
        "storage".to_string()
    }
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn load(&self) -> Result<Vec<Task>> {
        (**self).load()
    }

    fn save(&mut self, tasks: &[Task]) -> Result<()> {
        (**self).save(tasks)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// In-process backend
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    tasks: Option<Vec<Task>>,
    corrupt: bool,
    fail_saves: bool,
    save_count: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an already stored collection
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Some(tasks),
            ..Self::default()
        }
    }

    /// Stored data that fails to decode on load
    pub fn corrupt() -> Self {
        Self {
            corrupt: true,
            ..Self::default()
        }
    }

    /// Make every subsequent save fail
    pub fn set_fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    /// Last successfully saved collection
    pub fn stored(&self) -> Option<&[Task]> {
        self.tasks.as_deref()
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.save_count
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Vec<Task>> {
        if self.corrupt {
            return Err(eyre!("Stored tasks are not valid JSON"));
        }
        Ok(self.tasks.clone().unwrap_or_default())
    }

    fn save(&mut self, tasks: &[Task]) -> Result<()> {
        if self.fail_saves {
            return Err(eyre!("Storage quota exceeded"));
        }
        self.tasks = Some(tasks.to_vec());
        self.corrupt = false;
        self.save_count += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_memory_storage_empty_by_default() {
        let storage = MemoryStorage::new();
        assert!(storage.load().unwrap().is_empty());
        assert!(storage.stored().is_none());
    }

    #[test]
    fn test_memory_storage_save_and_load() {
        let mut storage = MemoryStorage::new();
        let tasks = vec![Task::new(1, "a".to_string(), Utc::now())];

        storage.save(&tasks).unwrap();
        assert_eq!(storage.load().unwrap(), tasks);
        assert_eq!(storage.save_count(), 1);
    }

    #[test]
    fn test_memory_storage_failures() {
        assert!(MemoryStorage::corrupt().load().is_err());

        let mut storage = MemoryStorage::new();
        storage.set_fail_saves(true);
        assert!(storage.save(&[]).is_err());
        assert_eq!(storage.save_count(), 0);
    }

    #[test]
    fn test_boxed_storage_delegates() {
        let mut storage: Box<dyn Storage> = Box::new(MemoryStorage::new());
        storage.save(&[Task::new(7, "b".to_string(), Utc::now())]).unwrap();
        assert_eq!(storage.load().unwrap()[0].id, 7);
        assert_eq!(storage.describe(), "memory");
    }
}
