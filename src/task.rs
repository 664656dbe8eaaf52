// Task record and timestamp helpers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task identifier: milliseconds since the Unix epoch at creation, bumped
/// past the highest id already issued.
pub type TaskId = i64;

/// A single to-do entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Build a pending task. `text` must already be trimmed and non-empty.
    pub(crate) fn new(id: TaskId, text: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            text,
            completed: false,
            created_at: now,
            completed_at: None,
        }
    }

    /// Flip completion, keeping `completed_at` in step with `completed`
    pub(crate) fn toggle(&mut self, now: DateTime<Utc>) {
        self.completed = !self.completed;
        self.completed_at = if self.completed { Some(now) } else { None };
    }
}

/// Current wall-clock time
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Milliseconds since the Unix epoch for a timestamp
pub fn to_ms(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}
