// User-facing operation results

use crate::task::TaskId;
use thiserror::Error;

/// Why an operation was refused. State is unchanged and nothing is saved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Please enter a task!")]
    EmptyText,

    #[error("Task cannot be empty!")]
    EmptyEdit,

    #[error("No completed tasks to clear!")]
    NothingToClear,

    #[error("Task {0} not found")]
    NotFound(TaskId),

    #[error("No task is being edited")]
    NoEditInProgress,

    #[error("Completed tasks changed since confirmation ({expected} confirmed, {found} now completed)")]
    CompletedChanged { expected: usize, found: usize },

    #[error("No task ids left")]
    IdsExhausted,
}

/// Result of an applied mutation
///
/// The mutation is in memory regardless of `persist_error`; a failed save
/// only means the on-disk copy is behind until the next successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub value: T,
    pub message: String,
    pub persist_error: Option<String>,
}

impl<T> Outcome<T> {
    pub(crate) fn new(value: T, message: impl Into<String>, persist_error: Option<String>) -> Self {
        Self {
            value,
            message: message.into(),
            persist_error,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.persist_error.is_none()
    }
}

/// Destructive action awaiting the caller's confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PendingAction {
    Delete(TaskId),
    ClearCompleted(usize),
}

/// Token minted by the store for a destructive request
///
/// Show `prompt()` to the user and hand the token back to carry the action
/// out; dropping it cancels.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Confirmation {
    pub(crate) action: PendingAction,
    prompt: String,
}

impl Confirmation {
    pub(crate) fn delete(id: TaskId) -> Self {
        Self {
            action: PendingAction::Delete(id),
            prompt: "Are you sure you want to delete this task?".to_string(),
        }
    }

    pub(crate) fn clear_completed(count: usize) -> Self {
        Self {
            action: PendingAction::ClearCompleted(count),
            prompt: format!("Are you sure you want to delete {} completed task(s)?", count),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        assert_eq!(Rejection::EmptyText.to_string(), "Please enter a task!");
        assert_eq!(Rejection::EmptyEdit.to_string(), "Task cannot be empty!");
        assert_eq!(Rejection::NothingToClear.to_string(), "No completed tasks to clear!");
        assert_eq!(Rejection::NotFound(42).to_string(), "Task 42 not found");
        assert_eq!(
            Rejection::CompletedChanged { expected: 2, found: 3 }.to_string(),
            "Completed tasks changed since confirmation (2 confirmed, 3 now completed)"
        );
    }

    #[test]
    fn test_confirmation_prompts() {
        assert_eq!(
            Confirmation::delete(1).prompt(),
            "Are you sure you want to delete this task?"
        );
        assert_eq!(
            Confirmation::clear_completed(3).prompt(),
            "Are you sure you want to delete 3 completed task(s)?"
        );
    }

    #[test]
    fn test_outcome_is_persisted() {
        let ok = Outcome::new((), "done", None);
        assert!(ok.is_persisted());

        let failed = Outcome::new((), "done", Some("disk full".to_string()));
        assert!(!failed.is_persisted());
    }
}
