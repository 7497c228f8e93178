use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::advisory::{AdvisoryKind, CompletionVerdict};
use crate::task::TaskId;
use crate::timer::{TimerMode, TimerState};

/// Every state change in the engine produces an Event.
/// Front ends drain them to render notices and refresh views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        task_id: Option<TaskId>,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero; the engine decides what happens next.
    TimerExpired {
        mode: TimerMode,
        task_id: Option<TaskId>,
        at: DateTime<Utc>,
    },
    TaskAdded {
        task_id: TaskId,
        parent_id: Option<TaskId>,
        at: DateTime<Utc>,
    },
    TaskToggled {
        task_id: TaskId,
        completed: bool,
        at: DateTime<Utc>,
    },
    TaskDeleted {
        task_id: TaskId,
        removed: usize,
        at: DateTime<Utc>,
    },
    /// A long task is waiting for the user to accept or refuse a split.
    DivisionSuggested {
        task_name: String,
        duration_secs: u64,
        reasoning: Option<String>,
        at: DateTime<Utc>,
    },
    /// A finished work session is waiting for the user to confirm a verdict.
    CompletionSuggested {
        task_id: TaskId,
        verdict: CompletionVerdict,
        at: DateTime<Utc>,
    },
    /// An advisory call failed and the fallback path was taken.
    AdvisoryFailed {
        advisory: AdvisoryKind,
        message: String,
        at: DateTime<Utc>,
    },
    /// The store pushed a new forest and it replaced local state.
    SnapshotApplied {
        task_count: usize,
        at: DateTime<Utc>,
    },
    SignedIn {
        user_id: String,
        at: DateTime<Utc>,
    },
    SignedOut {
        at: DateTime<Utc>,
    },
    /// Short user-facing message (toast).
    Notice {
        level: NoticeLevel,
        title: String,
        description: Option<String>,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        mode: TimerMode,
        task_id: Option<TaskId>,
        task_name: String,
        remaining_secs: u64,
        total_secs: u64,
        progress: f64,
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

impl Event {
    pub fn notice(title: impl Into<String>) -> Self {
        Event::Notice {
            level: NoticeLevel::Info,
            title: title.into(),
            description: None,
            at: Utc::now(),
        }
    }

    pub fn notice_with(title: impl Into<String>, description: impl Into<String>) -> Self {
        Event::Notice {
            level: NoticeLevel::Info,
            title: title.into(),
            description: Some(description.into()),
            at: Utc::now(),
        }
    }

    pub fn error_notice(title: impl Into<String>, description: Option<String>) -> Self {
        Event::Notice {
            level: NoticeLevel::Error,
            title: title.into(),
            description,
            at: Utc::now(),
        }
    }
}
