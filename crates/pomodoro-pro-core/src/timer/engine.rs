//! Session timer implementation.
//!
//! The timer is a tick-driven state machine. It does not own a clock or a
//! thread: the caller delivers one `tick()` per elapsed second while the
//! timer is running (see [`Ticker`](super::Ticker)).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused <-> Running) -> Expired
//!  ^                                           |
//!  +------------ start / start_break / reset --+
//! ```
//!
//! `Expired` is terminal for the timer; the session engine must start a new
//! run (work or break) or reset to leave it.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::task::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Work,
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    /// Countdown reached zero and is waiting for the engine to act.
    Expired,
}

/// Single countdown shared by work and break sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTimer {
    mode: TimerMode,
    state: TimerState,
    /// Seconds remaining in the current run.
    time_left: u64,
    active_task: Option<TaskId>,
    /// Bumped on every start/reset so tick sources can tell runs apart.
    run_id: u64,
}

impl SessionTimer {
    /// An idle work timer showing `work_duration` seconds.
    pub fn new(work_duration: u64) -> Self {
        Self {
            mode: TimerMode::Work,
            state: TimerState::Idle,
            time_left: work_duration,
            active_task: None,
            run_id: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn time_left(&self) -> u64 {
        self.time_left
    }

    pub fn active_task(&self) -> Option<&TaskId> {
        self.active_task.as_ref()
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn is_expired(&self) -> bool {
        self.state == TimerState::Expired
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a work session on `task_id`.
    pub fn start(&mut self, task_id: TaskId, duration: u64) -> Event {
        self.mode = TimerMode::Work;
        self.time_left = duration;
        self.active_task = Some(task_id.clone());
        self.begin_run();
        Event::TimerStarted {
            mode: TimerMode::Work,
            task_id: Some(task_id),
            duration_secs: duration,
            at: Utc::now(),
        }
    }

    /// Begin a break. The active task binding is kept for the next work run.
    pub fn start_break(&mut self, duration: u64) -> Event {
        self.mode = TimerMode::Break;
        self.time_left = duration;
        self.begin_run();
        Event::TimerStarted {
            mode: TimerMode::Break,
            task_id: None,
            duration_secs: duration,
            at: Utc::now(),
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Running => {
                self.state = TimerState::Paused;
                Some(Event::TimerPaused {
                    remaining_secs: self.time_left,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    /// Continue a paused run, or start counting down a reset timer.
    pub fn resume(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Paused => {}
            TimerState::Idle if self.time_left > 0 => {}
            _ => return None,
        }
        self.state = TimerState::Running;
        Some(Event::TimerResumed {
            remaining_secs: self.time_left,
            at: Utc::now(),
        })
    }

    /// Stop and show `duration` for the current mode without starting.
    pub fn reset(&mut self, duration: u64) -> Event {
        self.state = TimerState::Idle;
        self.time_left = duration;
        self.run_id += 1;
        Event::TimerReset {
            mode: self.mode,
            remaining_secs: duration,
            at: Utc::now(),
        }
    }

    pub fn set_mode(&mut self, mode: TimerMode) {
        self.mode = mode;
    }

    /// Drop the task binding and go back to an idle work timer.
    pub fn unbind(&mut self, work_duration: u64) -> Event {
        self.active_task = None;
        self.mode = TimerMode::Work;
        self.reset(work_duration)
    }

    /// One elapsed second. Returns `Some(Event::TimerExpired)` when the
    /// countdown hits zero; ticks outside `Running` are ignored.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left > 0 {
            return None;
        }
        self.state = TimerState::Expired;
        Some(Event::TimerExpired {
            mode: self.mode,
            task_id: self.active_task.clone(),
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin_run(&mut self) {
        self.state = TimerState::Running;
        self.run_id += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(duration: u64) -> SessionTimer {
        let mut timer = SessionTimer::new(1500);
        timer.start(TaskId::from("t"), duration);
        timer
    }

    #[test]
    fn new_timer_is_idle_work() {
        let timer = SessionTimer::new(1500);
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.mode(), TimerMode::Work);
        assert_eq!(timer.time_left(), 1500);
        assert!(timer.active_task().is_none());
    }

    #[test]
    fn start_pause_resume() {
        let mut timer = started(10);
        assert_eq!(timer.state(), TimerState::Running);
        assert_eq!(timer.active_task(), Some(&TaskId::from("t")));

        timer.tick();
        assert!(timer.pause().is_some());
        assert_eq!(timer.state(), TimerState::Paused);
        assert_eq!(timer.time_left(), 9);

        assert!(timer.resume().is_some());
        assert_eq!(timer.state(), TimerState::Running);
        assert_eq!(timer.time_left(), 9);
    }

    #[test]
    fn pause_is_only_valid_while_running() {
        let mut timer = SessionTimer::new(60);
        assert!(timer.pause().is_none());
        assert!(timer.resume().is_some());
        assert!(timer.resume().is_none());
    }

    #[test]
    fn ticks_down_and_expires_once() {
        let mut timer = started(3);
        assert!(timer.tick().is_none());
        assert!(timer.tick().is_none());
        match timer.tick() {
            Some(Event::TimerExpired { mode, task_id, .. }) => {
                assert_eq!(mode, TimerMode::Work);
                assert_eq!(task_id, Some(TaskId::from("t")));
            }
            other => panic!("Expected TimerExpired, got {other:?}"),
        }
        assert!(timer.is_expired());
        assert_eq!(timer.time_left(), 0);
        assert!(timer.tick().is_none());
        assert_eq!(timer.time_left(), 0);
    }

    #[test]
    fn paused_timer_ignores_ticks() {
        let mut timer = started(5);
        timer.pause();
        timer.tick();
        assert_eq!(timer.time_left(), 5);
    }

    #[test]
    fn expired_timer_cannot_resume() {
        let mut timer = started(1);
        timer.tick();
        assert!(timer.resume().is_none());
        assert!(timer.is_expired());
    }

    #[test]
    fn break_keeps_task_binding() {
        let mut timer = started(1);
        timer.tick();
        timer.start_break(300);
        assert_eq!(timer.mode(), TimerMode::Break);
        assert_eq!(timer.time_left(), 300);
        assert_eq!(timer.active_task(), Some(&TaskId::from("t")));
    }

    #[test]
    fn reset_keeps_mode_and_bumps_run() {
        let mut timer = started(100);
        timer.start_break(300);
        let run = timer.run_id();
        timer.reset(300);
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.mode(), TimerMode::Break);
        assert!(timer.run_id() > run);
    }

    #[test]
    fn unbind_returns_to_idle_work() {
        let mut timer = started(100);
        timer.unbind(1500);
        assert!(timer.active_task().is_none());
        assert_eq!(timer.mode(), TimerMode::Work);
        assert_eq!(timer.time_left(), 1500);
        assert_eq!(timer.state(), TimerState::Idle);
    }
}
