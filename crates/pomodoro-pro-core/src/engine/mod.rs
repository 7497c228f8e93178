//! Session orchestrator.
//!
//! [`SessionEngine`] owns the task tree, the timer and the sync bridge and
//! sequences them: a work session ending consults the completion advisory,
//! a long task being added consults the division advisory, and every tree
//! mutation is pushed to the store. Advisory calls are awaited while the
//! engine is mutably borrowed, so nothing can change the tree between a
//! request and the prompt it produces.
//!
//! User-facing messages and domain events are queued and handed out by
//! [`SessionEngine::drain_events`].

mod driver;
mod prompts;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::advisory::{
    Advisor, AdvisoryKind, CompletionRequest, CompletionVerdict, DivisionRequest,
    DivisionSuggestion, DIVISION_THRESHOLD_MINUTES,
};
use crate::auth::{AuthProvider, UserIdentity};
use crate::error::{CoreError, Result, SyncError, TaskError};
use crate::events::Event;
use crate::notify::{Notifier, SilentNotifier};
use crate::sync::{SyncBridge, TaskStore};
use crate::task::{divide_into_sessions, Task, TaskId, TaskTree, MAX_DURATION_SECS};
use crate::timer::{progress, SessionTimer, TimerMode, TimerState};

pub use driver::drive;
pub use prompts::{
    Answer, AutoConfirm, CompletionPrompt, DivisionPrompt, Prompt, PromptResolver,
    ScriptedResolver,
};

/// Process-wide session lengths, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub work_duration: u64,
    pub break_duration: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_duration: 25 * 60,
            break_duration: 5 * 60,
        }
    }
}

/// Result of [`SessionEngine::add_task`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddTaskOutcome {
    Created(TaskId),
    /// A division prompt is pending; nothing was created yet.
    AwaitingConfirmation,
    /// No user is signed in; nothing was created.
    SignInRequired,
}

pub struct SessionEngine<A> {
    tree: TaskTree,
    timer: SessionTimer,
    settings: Settings,
    user: Option<UserIdentity>,
    bridge: SyncBridge,
    notifier: Box<dyn Notifier>,
    advisor: A,
    pending: Option<Prompt>,
    events: Vec<Event>,
}

impl<A: Advisor> SessionEngine<A> {
    pub fn new(advisor: A, store: Box<dyn TaskStore>, settings: Settings) -> Self {
        Self {
            tree: TaskTree::new(),
            timer: SessionTimer::new(settings.work_duration),
            settings,
            user: None,
            bridge: SyncBridge::new(store),
            notifier: Box::new(SilentNotifier),
            advisor,
            pending: None,
            events: Vec::new(),
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn tree(&self) -> &TaskTree {
        &self.tree
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn advisor(&self) -> &A {
        &self.advisor
    }

    pub fn pending_prompt(&self) -> Option<&Prompt> {
        self.pending.as_ref()
    }

    /// The task bound to the timer, as it currently is in the tree.
    pub fn active_task(&self) -> Option<Task> {
        self.tree.find(self.timer.active_task()?)
    }

    pub fn active_task_name(&self) -> String {
        match self.active_task() {
            Some(task) => task.text,
            None if self.is_signed_in() => "Select a task".to_string(),
            None => "Login to start".to_string(),
        }
    }

    /// Length of the current run when it started from full.
    pub fn timer_total_duration(&self) -> u64 {
        match self.timer.mode() {
            TimerMode::Break => self.settings.break_duration,
            TimerMode::Work => self
                .active_task()
                .map(|task| task.duration)
                .unwrap_or(self.settings.work_duration),
        }
    }

    /// Sum of active root durations plus the breaks between them.
    pub fn total_remaining_time(&self) -> u64 {
        self.tree.total_remaining_time(self.settings.break_duration)
    }

    pub fn snapshot(&self) -> Event {
        let total = self.timer_total_duration();
        Event::StateSnapshot {
            state: self.timer.state(),
            mode: self.timer.mode(),
            task_id: self.timer.active_task().cloned(),
            task_name: self.active_task_name(),
            remaining_secs: self.timer.time_left(),
            total_secs: total,
            progress: progress(total, self.timer.time_left()),
            at: Utc::now(),
        }
    }

    /// Hand out every queued event, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Auth lifecycle ───────────────────────────────────────────────

    /// Sign in through `provider` and load the user's forest. A dismissed
    /// sign-in changes nothing; any other failure becomes an error notice.
    /// If the forest cannot be loaded the provider is signed out again.
    pub fn sign_in(&mut self, provider: &mut impl AuthProvider) -> Option<UserIdentity> {
        let identity = match provider.sign_in() {
            Ok(identity) => identity,
            Err(e) if e.is_dismissed() => {
                tracing::info!("sign-in dismissed by user");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "sign-in failed");
                self.events.push(Event::error_notice(
                    "Login failed",
                    Some("Could not sign in.".to_string()),
                ));
                return None;
            }
        };

        if let Err(e) = self.attach(identity.clone()) {
            tracing::warn!(error = %e, uid = %identity.uid, "could not load tasks after sign-in");
            if let Err(rollback) = provider.sign_out() {
                tracing::warn!(error = %rollback, "could not roll back sign-in");
            }
            let reset = self.clear_session();
            self.events.push(reset);
            self.events.push(Event::error_notice(
                "Login failed",
                Some(format!("Could not load tasks: {e}")),
            ));
            return None;
        }
        self.events.push(Event::notice("Successfully logged in!"));
        Some(identity)
    }

    /// Re-attach a previously signed-in user without going through a
    /// provider (e.g. from a saved session).
    pub fn restore_session(&mut self, identity: UserIdentity) -> Result<(), SyncError> {
        self.attach(identity)
    }

    fn attach(&mut self, identity: UserIdentity) -> Result<(), SyncError> {
        let forest = self.bridge.attach(identity.clone())?;
        tracing::info!(uid = %identity.uid, "signed in");
        self.events.push(Event::SignedIn {
            user_id: identity.uid.clone(),
            at: Utc::now(),
        });
        self.user = Some(identity);
        self.apply_snapshot(forest);
        Ok(())
    }

    /// Sign out through `provider`. The subscription is dropped before any
    /// local state is cleared.
    pub fn sign_out(&mut self, provider: &mut impl AuthProvider) -> bool {
        if let Err(e) = provider.sign_out() {
            tracing::warn!(error = %e, "sign-out failed");
            self.events.push(Event::error_notice("Logout failed", None));
            return false;
        }
        let reset = self.clear_session();
        tracing::info!("signed out");
        self.events.extend([
            reset,
            Event::SignedOut { at: Utc::now() },
            Event::notice("Successfully logged out."),
        ]);
        true
    }

    // ── Tasks ────────────────────────────────────────────────────────

    /// Add a root task. Tasks longer than an hour go through the division
    /// advisory first; tasks over [`MAX_DURATION_SECS`] are refused.
    pub async fn add_task(&mut self, text: &str, duration: u64) -> Result<AddTaskOutcome> {
        if !self.is_signed_in() {
            self.events.push(Event::notice_with(
                "Please log in",
                "You must be logged in to add tasks.",
            ));
            return Ok(AddTaskOutcome::SignInRequired);
        }
        if duration > MAX_DURATION_SECS {
            return Err(TaskError::TooLong {
                secs: duration,
                max: MAX_DURATION_SECS,
            }
            .into());
        }

        let request = DivisionRequest::new(text, duration);
        if request.task_duration_minutes > DIVISION_THRESHOLD_MINUTES {
            if self.pending.is_some() {
                return Err(CoreError::PromptPending);
            }
            let suggestion = match self.advisor.suggest_division(&request).await {
                Ok(suggestion) => suggestion,
                Err(e) => {
                    tracing::warn!(error = %e, task = text, "division advisory failed");
                    self.events.push(Event::AdvisoryFailed {
                        advisory: AdvisoryKind::Division,
                        message: e.to_string(),
                        at: Utc::now(),
                    });
                    DivisionSuggestion::fallback()
                }
            };
            if suggestion.should_divide {
                self.events.push(Event::DivisionSuggested {
                    task_name: text.to_string(),
                    duration_secs: duration,
                    reasoning: suggestion.reasoning.clone(),
                    at: Utc::now(),
                });
                self.pending = Some(Prompt::Division(DivisionPrompt {
                    task_name: text.to_string(),
                    duration,
                    reasoning: suggestion.reasoning,
                }));
                return Ok(AddTaskOutcome::AwaitingConfirmation);
            }
        }

        Ok(AddTaskOutcome::Created(self.create_root(text, duration)))
    }

    /// Accept a pending division: add the task split into sessions.
    pub fn confirm_division(&mut self) -> Option<TaskId> {
        let prompt = self.take_division()?;
        let divided = divide_into_sessions(&prompt.task_name, prompt.duration);
        let id = self.tree.insert_root(&divided)?;
        self.push();
        self.events.push(Event::TaskAdded {
            task_id: id.clone(),
            parent_id: None,
            at: Utc::now(),
        });
        Some(id)
    }

    /// Refuse a pending division: add the task whole.
    pub fn cancel_division(&mut self) -> Option<TaskId> {
        let prompt = self.take_division()?;
        Some(self.create_root(&prompt.task_name, prompt.duration))
    }

    pub fn add_subtask(&mut self, parent: &TaskId, text: &str, duration: u64) -> Option<TaskId> {
        let id = self.tree.add_subtask(parent, text, duration)?;
        self.push();
        self.events.push(Event::TaskAdded {
            task_id: id.clone(),
            parent_id: Some(parent.clone()),
            at: Utc::now(),
        });
        Some(id)
    }

    pub fn toggle_task(&mut self, id: &TaskId) -> Option<bool> {
        let completed = self.tree.toggle_completion(id)?;
        self.push();
        self.events.push(Event::TaskToggled {
            task_id: id.clone(),
            completed,
            at: Utc::now(),
        });
        Some(completed)
    }

    /// Delete a task and its subtree. Returns how many tasks were removed.
    /// If the active task goes with it, the timer is stopped and unbound.
    pub fn delete_task(&mut self, id: &TaskId) -> Option<usize> {
        let removed = self.tree.delete(id)?;
        self.push();
        self.events.push(Event::TaskDeleted {
            task_id: id.clone(),
            removed: removed.len(),
            at: Utc::now(),
        });
        if self
            .timer
            .active_task()
            .is_some_and(|active| removed.contains(active))
        {
            let reset = self.timer.unbind(self.settings.work_duration);
            self.events.push(reset);
        }
        Some(removed.len())
    }

    /// Replace the whole forest with a store push.
    pub fn apply_snapshot(&mut self, forest: Vec<Task>) {
        self.tree = TaskTree::from_forest(&forest);
        tracing::debug!(tasks = self.tree.len(), "applied store snapshot");
        self.events.push(Event::SnapshotApplied {
            task_count: self.tree.len(),
            at: Utc::now(),
        });
    }

    /// Apply a store push if one is waiting. Returns whether one was.
    pub fn poll_store(&mut self) -> bool {
        match self.bridge.poll() {
            Some(forest) => {
                self.apply_snapshot(forest);
                true
            }
            None => false,
        }
    }

    /// Wait for the next store push. Never completes while signed out.
    pub async fn next_store_push(&mut self) -> Vec<Task> {
        self.bridge.next_snapshot().await
    }

    // ── Timer ────────────────────────────────────────────────────────

    /// Bind the timer to `id` and start a work session of `duration_override`
    /// seconds, or the task's own duration.
    pub fn start_task(&mut self, id: &TaskId, duration_override: Option<u64>) -> Result<()> {
        if self.pending.is_some() {
            return Err(CoreError::PromptPending);
        }
        let task = self.tree.require(id)?;
        let duration = duration_override.unwrap_or_else(|| self.work_duration_for(&task));
        let event = self.timer.start(task.id, duration);
        self.events.push(event);
        Ok(())
    }

    pub fn pause(&mut self) -> bool {
        self.timer.pause().map(|event| self.events.push(event)).is_some()
    }

    /// Resume a paused run, or start a reset one. A work session needs a
    /// bound task.
    pub fn resume(&mut self) -> bool {
        if self.timer.mode() == TimerMode::Work && self.timer.active_task().is_none() {
            return false;
        }
        self.timer.resume().map(|event| self.events.push(event)).is_some()
    }

    /// Stop and restore the full length of the current mode.
    pub fn reset(&mut self) {
        let duration = match self.timer.mode() {
            TimerMode::Break => self.settings.break_duration,
            TimerMode::Work => self.bound_work_duration(),
        };
        let event = self.timer.reset(duration);
        self.events.push(event);
    }

    /// Change session lengths. An idle, unbound work timer picks up the new
    /// work duration.
    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings;
        if self.timer.state() == TimerState::Idle
            && self.timer.mode() == TimerMode::Work
            && self.timer.active_task().is_none()
        {
            let event = self.timer.reset(settings.work_duration);
            self.events.push(event);
        }
    }

    /// One elapsed second. When the countdown expires the session end is
    /// handled before this returns, including any advisory call.
    pub async fn tick(&mut self) {
        let Some(expired) = self.timer.tick() else {
            tracing::trace!(left = self.timer.time_left(), "tick");
            return;
        };
        self.events.push(expired);
        match self.timer.mode() {
            TimerMode::Work => self.finish_work().await,
            TimerMode::Break => self.finish_break(),
        }
    }

    async fn finish_work(&mut self) {
        if let Err(e) = self.notifier.play_work_end() {
            tracing::debug!(error = %e, "work-end notification failed");
        }

        let Some(task) = self.active_task().filter(|task| !task.completed) else {
            self.start_break();
            return;
        };
        if self.pending.is_some() {
            tracing::warn!(task = %task.id, "prompt already pending, skipping completion advisory");
            self.start_break();
            return;
        }

        let request = CompletionRequest {
            task_name: task.text.clone(),
        };
        match self.advisor.evaluate_completion(&request).await {
            Ok(verdict) => {
                self.events.push(Event::CompletionSuggested {
                    task_id: task.id.clone(),
                    verdict,
                    at: Utc::now(),
                });
                self.pending = Some(Prompt::Completion(CompletionPrompt {
                    task_id: task.id,
                    task_name: task.text,
                    verdict,
                }));
            }
            Err(e) => {
                tracing::warn!(error = %e, task = %task.id, "completion advisory failed");
                self.events.push(Event::AdvisoryFailed {
                    advisory: AdvisoryKind::Completion,
                    message: e.to_string(),
                    at: Utc::now(),
                });
                self.apply_verdict(task.id, CompletionVerdict::FALLBACK);
            }
        }
    }

    fn finish_break(&mut self) {
        if let Err(e) = self.notifier.play_break_end() {
            tracing::debug!(error = %e, "break-end notification failed");
        }
        self.events.push(Event::notice_with(
            "Break's over!",
            "Time to get back to work.",
        ));
        self.timer.set_mode(TimerMode::Work);
        let event = self.timer.reset(self.bound_work_duration());
        self.events.push(event);
    }

    /// Apply the pending completion verdict.
    pub fn confirm_completion(&mut self) -> bool {
        let Some(prompt) = self.take_completion() else {
            return false;
        };
        self.apply_verdict(prompt.task_id, prompt.verdict);
        true
    }

    /// A task deleted in the meantime just gets a break.
    fn apply_verdict(&mut self, task_id: TaskId, verdict: CompletionVerdict) {
        if !self.tree.contains(&task_id) {
            self.start_break();
            return;
        }
        match verdict {
            CompletionVerdict::AddTime { minutes } => {
                let event = self.timer.start(task_id, u64::from(minutes) * 60);
                self.events.push(event);
            }
            CompletionVerdict::Complete => {
                if self.tree.set_completed(&task_id, true) {
                    self.push();
                    self.events.push(Event::TaskToggled {
                        task_id,
                        completed: true,
                        at: Utc::now(),
                    });
                }
                self.start_break();
            }
            CompletionVerdict::Incomplete => self.start_break(),
        }
    }

    /// Dismiss the pending completion verdict and take a break.
    pub fn cancel_completion(&mut self) -> bool {
        if self.take_completion().is_none() {
            return false;
        }
        self.start_break();
        true
    }

    /// Route an answer to whichever prompt is pending.
    pub fn answer_prompt(&mut self, answer: Answer) -> bool {
        match (&self.pending, answer) {
            (Some(Prompt::Division(_)), Answer::Confirm) => self.confirm_division().is_some(),
            (Some(Prompt::Division(_)), Answer::Cancel) => self.cancel_division().is_some(),
            (Some(Prompt::Completion(_)), Answer::Confirm) => self.confirm_completion(),
            (Some(Prompt::Completion(_)), Answer::Cancel) => self.cancel_completion(),
            (None, _) => false,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Drop the subscription first, then every piece of per-user state.
    fn clear_session(&mut self) -> Event {
        self.bridge.detach();
        self.user = None;
        self.tree = TaskTree::new();
        self.pending = None;
        self.timer.unbind(self.settings.work_duration)
    }

    fn create_root(&mut self, text: &str, duration: u64) -> TaskId {
        let id = self.tree.add_root(text, duration);
        self.push();
        self.events.push(Event::TaskAdded {
            task_id: id.clone(),
            parent_id: None,
            at: Utc::now(),
        });
        id
    }

    fn start_break(&mut self) {
        let event = self.timer.start_break(self.settings.break_duration);
        self.events.push(event);
        self.events.push(Event::notice("Time for a break!"));
    }

    fn work_duration_for(&self, task: &Task) -> u64 {
        if task.duration > 0 {
            task.duration
        } else {
            self.settings.work_duration
        }
    }

    fn bound_work_duration(&self) -> u64 {
        match self.active_task() {
            Some(task) => self.work_duration_for(&task),
            None => self.settings.work_duration,
        }
    }

    fn take_division(&mut self) -> Option<DivisionPrompt> {
        match self.pending.take() {
            Some(Prompt::Division(prompt)) => Some(prompt),
            other => {
                self.pending = other;
                None
            }
        }
    }

    fn take_completion(&mut self) -> Option<CompletionPrompt> {
        match self.pending.take() {
            Some(Prompt::Completion(prompt)) => Some(prompt),
            other => {
                self.pending = other;
                None
            }
        }
    }

    fn push(&mut self) {
        let forest = self.tree.to_forest();
        self.bridge.push(&forest);
    }
}

impl<A> std::fmt::Debug for SessionEngine<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEngine")
            .field("user", &self.user)
            .field("tasks", &self.tree.len())
            .field("timer", &self.timer)
            .field("settings", &self.settings)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}
