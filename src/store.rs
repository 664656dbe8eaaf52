// Task store: the ordered collection plus its view and edit state

use crate::filter::Filter;
use crate::outcome::{Confirmation, Outcome, PendingAction, Rejection};
use crate::storage::Storage;
use crate::task::{Task, TaskId, now, to_ms};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Derived collection sizes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
}

/// Owns the task collection and writes it back after every mutation
///
/// Tasks are kept newest first. Every successful mutation saves the full
/// collection through `S`; a failed save is reported in the returned
/// `Outcome` and the in-memory collection stays authoritative.
pub struct TaskStore<S: Storage> {
    tasks: Vec<Task>,
    filter: Filter,
    editing: Option<TaskId>,
    last_id: TaskId,
    storage: S,
}

impl<S: Storage> TaskStore<S> {
    /// Load the collection from `storage`
    ///
    /// Unreadable data yields an empty store; it is replaced on the next
    /// successful save.
    pub fn open(storage: S) -> Self {
        let loaded = match storage.load() {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(
                    storage = %storage.describe(),
                    error = ?e,
                    "Failed to load tasks, starting empty"
                );
                Vec::new()
            }
        };

        let tasks = normalize(loaded);
        let last_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);

        info!(storage = %storage.describe(), count = tasks.len(), "Task store opened");

        Self {
            tasks,
            filter: Filter::default(),
            editing: None,
            last_id,
            storage,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Whole collection, newest first
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Prepend a new pending task
    pub fn add(&mut self, text: &str) -> Result<Outcome<TaskId>, Rejection> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Rejection::EmptyText);
        }

        let created_at = now();
        let id = self.next_id(to_ms(created_at))?;
        self.tasks.insert(0, Task::new(id, text.to_string(), created_at));
        debug!(id, "Task added");

        let persist_error = self.persist();
        Ok(Outcome::new(id, "Task added successfully!", persist_error))
    }

    /// Flip completion; the value is the new `completed` state
    pub fn toggle(&mut self, id: TaskId) -> Result<Outcome<bool>, Rejection> {
        let task = self.find_mut(id)?;
        task.toggle(now());
        let completed = task.completed;
        debug!(id, completed, "Task toggled");

        let message = if completed {
            "Task marked as completed!"
        } else {
            "Task marked as pending!"
        };
        let persist_error = self.persist();
        Ok(Outcome::new(completed, message, persist_error))
    }

    /// Replace a task's text
    pub fn edit(&mut self, id: TaskId, new_text: &str) -> Result<Outcome<()>, Rejection> {
        let new_text = new_text.trim();
        if new_text.is_empty() {
            return Err(Rejection::EmptyEdit);
        }

        let task = self.find_mut(id)?;
        task.text = new_text.to_string();
        debug!(id, "Task edited");

        let persist_error = self.persist();
        Ok(Outcome::new((), "Task updated successfully!", persist_error))
    }

    /// Start editing `id`; returns the text to prefill
    pub fn begin_edit(&mut self, id: TaskId) -> Result<&str, Rejection> {
        let index = self.position(id)?;
        self.editing = Some(id);
        Ok(&self.tasks[index].text)
    }

    pub fn editing(&self) -> Option<TaskId> {
        self.editing
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Apply `new_text` to the task being edited
    ///
    /// The session stays open when the text is rejected as empty.
    pub fn save_edit(&mut self, new_text: &str) -> Result<Outcome<TaskId>, Rejection> {
        let id = self.editing.ok_or(Rejection::NoEditInProgress)?;
        let outcome = match self.edit(id, new_text) {
            Ok(outcome) => outcome,
            Err(Rejection::NotFound(id)) => {
                self.editing = None;
                return Err(Rejection::NotFound(id));
            }
            Err(e) => return Err(e),
        };
        self.editing = None;
        Ok(Outcome::new(id, outcome.message, outcome.persist_error))
    }

    /// First phase of deleting a task
    pub fn request_delete(&self, id: TaskId) -> Result<Confirmation, Rejection> {
        self.position(id)?;
        Ok(Confirmation::delete(id))
    }

    /// First phase of removing every completed task
    pub fn request_clear_completed(&self) -> Result<Confirmation, Rejection> {
        let completed = self.counts().completed;
        if completed == 0 {
            return Err(Rejection::NothingToClear);
        }
        Ok(Confirmation::clear_completed(completed))
    }

    /// Carry out a confirmed destructive request; the value is the removed tasks
    pub fn confirm(&mut self, confirmation: Confirmation) -> Result<Outcome<Vec<Task>>, Rejection> {
        match confirmation.action {
            PendingAction::Delete(id) => self.delete(id),
            PendingAction::ClearCompleted(expected) => self.clear_completed(expected),
        }
    }

    fn delete(&mut self, id: TaskId) -> Result<Outcome<Vec<Task>>, Rejection> {
        let index = self.position(id)?;
        let removed = self.tasks.remove(index);
        if self.editing == Some(id) {
            self.editing = None;
        }
        debug!(id, "Task deleted");

        let persist_error = self.persist();
        Ok(Outcome::new(vec![removed], "Task deleted successfully!", persist_error))
    }

    fn clear_completed(&mut self, expected: usize) -> Result<Outcome<Vec<Task>>, Rejection> {
        let found = self.counts().completed;
        if found == 0 {
            return Err(Rejection::NothingToClear);
        }
        // Count must match the one shown in the prompt
        if found != expected {
            return Err(Rejection::CompletedChanged { expected, found });
        }

        let (removed, kept): (Vec<Task>, Vec<Task>) =
            std::mem::take(&mut self.tasks).into_iter().partition(|t| t.completed);
        self.tasks = kept;

        if self.editing.is_some_and(|id| removed.iter().any(|t| t.id == id)) {
            self.editing = None;
        }
        debug!(count = removed.len(), "Completed tasks cleared");

        let persist_error = self.persist();
        Ok(Outcome::new(removed, "Completed tasks cleared!", persist_error))
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// Tasks matching the current filter, in collection order
    pub fn list_visible(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| self.filter.matches(t)).collect()
    }

    pub fn counts(&self) -> Counts {
        let completed = self.tasks.iter().filter(|t| t.completed).count();
        Counts {
            total: self.tasks.len(),
            pending: self.tasks.len() - completed,
            completed,
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn position(&self, id: TaskId) -> Result<usize, Rejection> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(Rejection::NotFound(id))
    }

    fn find_mut(&mut self, id: TaskId) -> Result<&mut Task, Rejection> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(Rejection::NotFound(id))
    }

    /// Timestamp-derived id, strictly above every id issued so far
    fn next_id(&mut self, now_ms: i64) -> Result<TaskId, Rejection> {
        let floor = self.last_id.checked_add(1).ok_or(Rejection::IdsExhausted)?;
        let id = now_ms.max(floor);
        self.last_id = id;
        Ok(id)
    }

    fn persist(&mut self) -> Option<String> {
        match self.storage.save(&self.tasks) {
            Ok(()) => None,
            Err(e) => {
                warn!(
                    storage = %self.storage.describe(),
                    error = ?e,
                    "Failed to save tasks, keeping in-memory state"
                );
                Some(format!("{:#}", e))
            }
        }
    }
}

/// Repair or drop loaded records that break the collection invariants
fn normalize(loaded: Vec<Task>) -> Vec<Task> {
    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(loaded.len());

    for mut task in loaded {
        if !seen.insert(task.id) {
            warn!(id = task.id, "Dropping task with duplicate id");
            continue;
        }

        let trimmed = task.text.trim();
        if trimmed.is_empty() {
            warn!(id = task.id, "Dropping task with empty text");
            continue;
        }
        if trimmed.len() != task.text.len() {
            task.text = trimmed.to_string();
        }

        match (task.completed, task.completed_at) {
            (true, None) => {
                warn!(id = task.id, "Completed task without completion time");
                task.completed_at = Some(task.created_at);
            }
            (false, Some(_)) => {
                warn!(id = task.id, "Pending task with completion time");
                task.completed_at = None;
            }
            _ => {}
        }

        tasks.push(task);
    }

    tasks
}
