//! Task records and the task forest.
//!
//! A [`Task`] is the nested, serializable shape that crosses the store and
//! CLI boundary. Inside the engine tasks live in a flat [`TaskTree`] arena
//! and are only materialized as nested values on demand.

pub mod split;
pub mod tree;

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub use split::{divide_into_sessions, SESSION_SECS};
pub use tree::TaskTree;

/// Longest duration accepted for a new task: 999 hours.
pub const MAX_DURATION_SECS: u64 = 999 * 3600;

/// Opaque task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generate a fresh id: `<millis>-<7 random base-36 chars>`.
    ///
    /// The millisecond part never goes backwards within a process, even if
    /// the wall clock does.
    pub fn generate() -> Self {
        static LAST_MS: AtomicI64 = AtomicI64::new(0);

        let now = Utc::now().timestamp_millis();
        let prev = LAST_MS.fetch_max(now, Ordering::Relaxed);
        let millis = prev.max(now);

        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(7)
            .map(|c| (c as char).to_ascii_lowercase())
            .collect();

        TaskId(format!("{millis}-{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId(s)
    }
}

/// A task with its nested subtasks, as stored remotely.
///
/// Field names follow the store's camelCase layout. The store drops empty
/// arrays and nulls, so both `subtasks` and `parentId` tolerate absence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    /// Seconds. For tasks with subtasks this is the sum of the children.
    pub duration: u64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub subtasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TaskId>,
}

impl Task {
    /// A new, incomplete leaf with a generated id.
    pub fn new(text: impl Into<String>, duration: u64) -> Self {
        Self {
            id: TaskId::generate(),
            text: text.into(),
            duration,
            completed: false,
            subtasks: Vec::new(),
            parent_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_and_shaped() {
        let a = TaskId::generate();
        let b = TaskId::generate();
        assert_ne!(a, b);

        let (millis, suffix) = a.as_str().split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 7);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn deserializes_store_shape_without_optional_fields() {
        let json = r#"[{"id":"1","text":"Write","duration":600,"completed":false}]"#;
        let forest: Vec<Task> = serde_json::from_str(json).unwrap();
        assert_eq!(forest[0].subtasks, Vec::new());
        assert_eq!(forest[0].parent_id, None);
    }

    #[test]
    fn serializes_camel_case_and_omits_root_parent() {
        let mut task = Task::new("Read", 300);
        task.id = TaskId::from("t1");
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["text"], "Read");
        assert_eq!(value["subtasks"], serde_json::json!([]));
        assert!(value.get("parentId").is_none());

        task.parent_id = Some(TaskId::from("p"));
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["parentId"], "p");
    }
}
