//! # Pomodoro Pro Core Library
//!
//! This library provides the core logic for Pomodoro Pro, a work/break
//! countdown timer run against a hierarchical task list. Front ends (the
//! `pomodoro-pro` CLI) are thin layers over the same core.
//!
//! ## Architecture
//!
//! - **Task Tree**: arena-backed forest with bottom-up duration sums
//! - **Session Timer**: tick-driven work/break countdown, plus the single
//!   one-second [`Ticker`] that feeds it
//! - **Session Engine**: sequences timer expiry into advisories, prompts and
//!   breaks, and owns the add-task division flow and sign-in lifecycle
//! - **Sync**: whole-forest replacement against a per-user [`TaskStore`]
//! - **Storage**: data directory and TOML configuration
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: orchestrator, driven by [`drive`]
//! - [`TaskTree`]: task storage and derived views
//! - [`Advisor`]: division/completion advice (rule-based or generative)
//! - [`Config`]: application configuration management

pub mod advisory;
pub mod auth;
pub mod engine;
pub mod error;
pub mod events;
pub mod notify;
pub mod storage;
pub mod sync;
pub mod task;
pub mod timer;

pub use advisory::{
    Advisor, CompletionVerdict, ConfiguredAdvisor, DivisionSuggestion, GenerativeAdvisor,
    RuleAdvisor,
};
pub use auth::{AuthProvider, LocalProfileAuth, StaticAuth, UserIdentity};
pub use engine::{
    drive, AddTaskOutcome, Answer, AutoConfirm, Prompt, PromptResolver, ScriptedResolver,
    SessionEngine, Settings,
};
pub use error::{AdvisoryError, AuthError, ConfigError, CoreError, SyncError, TaskError};
pub use events::{Event, NoticeLevel};
pub use notify::{BellNotifier, Notifier, SilentNotifier};
pub use storage::{data_dir, Config};
pub use sync::{FileStore, MemoryStore, Subscription, SyncBridge, TaskStore};
pub use task::{Task, TaskId, TaskTree};
pub use timer::{format_clock, format_duration, SessionTimer, Ticker, TimerMode, TimerState};
