// View filters over the task collection

use crate::task::Task;
use serde::{Deserialize, Serialize};

/// Which tasks `TaskStore::list_visible` returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Pending,
    #[value(alias = "done")]
    Completed,
}

impl Filter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Pending => !task.completed,
            Filter::Completed => task.completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Pending => "pending",
            Filter::Completed => "completed",
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(completed: bool) -> Task {
        let mut task = Task::new(1, "x".to_string(), Utc::now());
        if completed {
            task.toggle(Utc::now());
        }
        task
    }

    #[test]
    fn test_filter_matches() {
        let done = task(true);
        let open = task(false);

        assert!(Filter::All.matches(&done));
        assert!(Filter::All.matches(&open));
        assert!(Filter::Pending.matches(&open));
        assert!(!Filter::Pending.matches(&done));
        assert!(Filter::Completed.matches(&done));
        assert!(!Filter::Completed.matches(&open));
    }

    #[test]
    fn test_filter_display() {
        assert_eq!(Filter::All.to_string(), "all");
        assert_eq!(Filter::Pending.to_string(), "pending");
        assert_eq!(Filter::Completed.to_string(), "completed");
    }

    #[test]
    fn test_filter_serialization_matches_display() {
        for filter in [Filter::All, Filter::Pending, Filter::Completed] {
            let json = serde_json::to_string(&filter).unwrap();
            assert_eq!(json, format!("\"{}\"", filter));
        }
    }

    #[test]
    fn test_filter_default_is_all() {
        assert_eq!(Filter::default(), Filter::All);
    }
}
