//! Splitting a long task into pomodoro-sized parts.

use super::{Task, TaskId};

/// Length of one work session used when dividing a task (25 minutes).
pub const SESSION_SECS: u64 = 25 * 60;

/// Build a parent task holding `ceil(duration / 25 min)` children named
/// `"<name> (Part k)"`. Every part is a full session except the last, which
/// takes whatever remains. The parent's duration is the sum of its parts.
///
/// One child is built per session, so callers keep `duration` within
/// [`MAX_DURATION_SECS`](super::MAX_DURATION_SECS).
pub fn divide_into_sessions(name: &str, duration: u64) -> Task {
    let mut parent = Task::new(name, 0);
    let parts = duration.div_ceil(SESSION_SECS);

    let mut remaining = duration;
    for k in 1..=parts {
        let part = remaining.min(SESSION_SECS);
        parent.subtasks.push(Task {
            id: TaskId::generate(),
            text: format!("{name} (Part {k})"),
            duration: part,
            completed: false,
            subtasks: Vec::new(),
            parent_id: Some(parent.id.clone()),
        });
        remaining -= part;
    }

    parent.duration = duration;
    parent
}
