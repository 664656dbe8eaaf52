// tasklist - Local to-do list store with JSON file or SQLite persistence

pub mod config;
pub mod filter;
pub mod json_file;
pub mod outcome;
pub mod sqlite;
pub mod storage;
pub mod store;
pub mod task;
pub mod view;

// Re-export main types for convenience
pub use filter::Filter;
pub use json_file::JsonFileStorage;
pub use outcome::{Confirmation, Outcome, Rejection};
pub use sqlite::SqliteStorage;
pub use storage::{MemoryStorage, Storage};
pub use store::{Counts, TaskStore};
pub use task::{Task, TaskId};
