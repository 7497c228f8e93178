//! End-to-end session flows through the engine with a scripted advisor.

use std::cell::Cell;

use pomodoro_pro_core::advisory::{CompletionRequest, DivisionRequest};
use pomodoro_pro_core::{
    AddTaskOutcome, AdvisoryError, Advisor, CompletionVerdict, DivisionSuggestion, Event,
    MemoryStore, Prompt, SessionEngine, Settings, StaticAuth, Task, TaskId, TimerMode,
    TimerState, UserIdentity,
};

/// Advisor with fixed answers. `None` makes the call fail.
struct StubAdvisor {
    divide: Option<bool>,
    verdict: Option<CompletionVerdict>,
    division_calls: Cell<usize>,
    completion_calls: Cell<usize>,
}

impl StubAdvisor {
    fn new(divide: Option<bool>, verdict: Option<CompletionVerdict>) -> Self {
        Self {
            divide,
            verdict,
            division_calls: Cell::new(0),
            completion_calls: Cell::new(0),
        }
    }
}

impl Advisor for StubAdvisor {
    async fn suggest_division(
        &self,
        _request: &DivisionRequest,
    ) -> Result<DivisionSuggestion, AdvisoryError> {
        self.division_calls.set(self.division_calls.get() + 1);
        match self.divide {
            Some(should_divide) => Ok(DivisionSuggestion {
                should_divide,
                reasoning: Some("stub".into()),
            }),
            None => Err(AdvisoryError::Malformed("stub failure".into())),
        }
    }

    async fn evaluate_completion(
        &self,
        _request: &CompletionRequest,
    ) -> Result<CompletionVerdict, AdvisoryError> {
        self.completion_calls.set(self.completion_calls.get() + 1);
        self.verdict
            .ok_or_else(|| AdvisoryError::Malformed("stub failure".into()))
    }
}

const SETTINGS: Settings = Settings {
    work_duration: 1500,
    break_duration: 300,
};

fn signed_in(advisor: StubAdvisor) -> (SessionEngine<StubAdvisor>, MemoryStore) {
    let store = MemoryStore::new();
    let mut engine = SessionEngine::new(advisor, Box::new(store.clone()), SETTINGS);
    assert!(engine.sign_in(&mut StaticAuth::user("tester")).is_some());
    engine.drain_events();
    (engine, store)
}

async fn created(engine: &mut SessionEngine<StubAdvisor>, text: &str, duration: u64) -> TaskId {
    match engine.add_task(text, duration).await.unwrap() {
        AddTaskOutcome::Created(id) => id,
        other => panic!("Expected Created, got {other:?}"),
    }
}

async fn run_out(engine: &mut SessionEngine<StubAdvisor>) {
    let mut guard = 0;
    while engine.timer().is_running() {
        engine.tick().await;
        guard += 1;
        assert!(guard < 10_000, "timer never expired");
        if engine.timer().mode() == TimerMode::Break && engine.timer().time_left() == SETTINGS.break_duration {
            break;
        }
    }
}

fn has_notice(events: &[Event], wanted: &str) -> bool {
    events
        .iter()
        .any(|e| matches!(e, Event::Notice { title, .. } if title == wanted))
}

#[tokio::test]
async fn ninety_minute_task_split_on_confirm() {
    let (mut engine, store) = signed_in(StubAdvisor::new(Some(true), None));

    let outcome = engine.add_task("Write report", 90 * 60).await.unwrap();
    assert_eq!(outcome, AddTaskOutcome::AwaitingConfirmation);
    assert_eq!(engine.advisor().division_calls.get(), 1);

    let parent_id = engine.confirm_division().unwrap();
    let stored = store.value(&UserIdentity::new("tester")).unwrap();
    assert_eq!(stored.len(), 1);

    let parent = &stored[0];
    assert_eq!(parent.id, parent_id);
    assert_eq!(parent.text, "Write report");
    let minutes: Vec<u64> = parent.subtasks.iter().map(|t| t.duration / 60).collect();
    assert_eq!(minutes, vec![25, 25, 25, 15]);
    assert_eq!(parent.duration, 90 * 60);
}

#[tokio::test]
async fn division_failure_creates_exactly_one_task() {
    let (mut engine, _) = signed_in(StubAdvisor::new(None, None));

    let outcome = engine.add_task("X", 4500).await.unwrap();
    assert!(matches!(outcome, AddTaskOutcome::Created(_)));

    let forest = engine.tree().to_forest();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].text, "X");
    assert_eq!(forest[0].duration, 4500);
    assert!(forest[0].subtasks.is_empty());

    let events = engine.drain_events();
    assert!(events.iter().any(|e| matches!(e, Event::AdvisoryFailed { .. })));
    assert!(engine.pending_prompt().is_none());
}

#[tokio::test]
async fn division_declined_or_short_task_skips_prompt() {
    let (mut engine, _) = signed_in(StubAdvisor::new(Some(false), None));
    created(&mut engine, "Long but fine", 4000).await;
    created(&mut engine, "Exactly an hour", 3600).await;
    assert_eq!(engine.advisor().division_calls.get(), 1);
    assert_eq!(engine.tree().len(), 2);
}

#[tokio::test]
async fn completed_active_task_goes_straight_to_break() {
    let (mut engine, _) = signed_in(StubAdvisor::new(None, Some(CompletionVerdict::Complete)));
    let id = created(&mut engine, "Done already", 3).await;
    engine.start_task(&id, None).unwrap();
    engine.toggle_task(&id);

    run_out(&mut engine).await;

    assert_eq!(engine.advisor().completion_calls.get(), 0);
    assert_eq!(engine.timer().mode(), TimerMode::Break);
    assert_eq!(engine.timer().state(), TimerState::Running);
    assert_eq!(engine.timer().time_left(), SETTINGS.break_duration);
    assert!(has_notice(&engine.drain_events(), "Time for a break!"));
}

#[tokio::test]
async fn complete_verdict_marks_task_then_breaks() {
    let (mut engine, store) = signed_in(StubAdvisor::new(None, Some(CompletionVerdict::Complete)));
    let id = created(&mut engine, "Essay", 2).await;
    engine.start_task(&id, None).unwrap();

    run_out(&mut engine).await;
    assert_eq!(engine.timer().state(), TimerState::Expired);
    match engine.pending_prompt() {
        Some(Prompt::Completion(prompt)) => {
            assert_eq!(prompt.task_id, id);
            assert_eq!(prompt.verdict, CompletionVerdict::Complete);
        }
        other => panic!("Expected completion prompt, got {other:?}"),
    }

    assert!(engine.confirm_completion());
    assert!(engine.tree().find(&id).unwrap().completed);
    assert!(store.value(&UserIdentity::new("tester")).unwrap()[0].completed);
    assert_eq!(engine.timer().mode(), TimerMode::Break);
    assert!(engine.timer().is_running());
}

#[tokio::test]
async fn add_time_restarts_same_task() {
    let (mut engine, _) = signed_in(StubAdvisor::new(
        None,
        Some(CompletionVerdict::AddTime { minutes: 5 }),
    ));
    let id = created(&mut engine, "Refactor", 1).await;
    engine.start_task(&id, None).unwrap();
    run_out(&mut engine).await;

    assert!(engine.confirm_completion());
    assert_eq!(engine.timer().mode(), TimerMode::Work);
    assert_eq!(engine.timer().time_left(), 300);
    assert_eq!(engine.timer().active_task(), Some(&id));
    assert!(!engine.tree().find(&id).unwrap().completed);
}

#[tokio::test]
async fn dismissing_a_verdict_still_breaks() {
    let (mut engine, _) = signed_in(StubAdvisor::new(None, Some(CompletionVerdict::Complete)));
    let id = created(&mut engine, "Review", 1).await;
    engine.start_task(&id, None).unwrap();
    run_out(&mut engine).await;

    assert!(engine.cancel_completion());
    assert!(!engine.tree().find(&id).unwrap().completed);
    assert_eq!(engine.timer().mode(), TimerMode::Break);
    assert!(engine.pending_prompt().is_none());
}

#[tokio::test]
async fn completion_failure_falls_back_to_break() {
    let (mut engine, _) = signed_in(StubAdvisor::new(None, None));
    let id = created(&mut engine, "Flaky", 1).await;
    engine.start_task(&id, None).unwrap();
    run_out(&mut engine).await;

    assert_eq!(engine.advisor().completion_calls.get(), 1);
    assert!(engine.pending_prompt().is_none());
    assert_eq!(engine.timer().mode(), TimerMode::Break);
    assert!(engine.timer().is_running());
    assert!(engine
        .drain_events()
        .iter()
        .any(|e| matches!(e, Event::AdvisoryFailed { .. })));
}

#[tokio::test]
async fn deleted_task_at_confirmation_means_break() {
    let (mut engine, _) = signed_in(StubAdvisor::new(
        None,
        Some(CompletionVerdict::AddTime { minutes: 10 }),
    ));
    let id = created(&mut engine, "Vanishing", 1).await;
    engine.start_task(&id, None).unwrap();
    run_out(&mut engine).await;

    engine.delete_task(&id);
    assert!(engine.confirm_completion());
    assert_eq!(engine.timer().mode(), TimerMode::Break);
    assert!(engine.timer().is_running());
}

#[tokio::test]
async fn break_end_resets_to_task_duration() {
    let settings = Settings {
        work_duration: 1500,
        break_duration: 2,
    };
    let store = MemoryStore::new();
    let mut engine = SessionEngine::new(
        StubAdvisor::new(None, Some(CompletionVerdict::Incomplete)),
        Box::new(store),
        settings,
    );
    engine.sign_in(&mut StaticAuth::user("tester"));
    let id = created(&mut engine, "Study", 1).await;
    engine.start_task(&id, None).unwrap();
    engine.tick().await;
    assert!(engine.confirm_completion());
    engine.drain_events();

    engine.tick().await;
    engine.tick().await;

    assert_eq!(engine.timer().mode(), TimerMode::Work);
    assert_eq!(engine.timer().state(), TimerState::Idle);
    assert_eq!(engine.timer().time_left(), 1);
    assert_eq!(engine.advisor().completion_calls.get(), 1);
    assert!(has_notice(&engine.drain_events(), "Break's over!"));
}

#[tokio::test]
async fn pause_then_resume_keeps_time_left() {
    let (mut engine, _) = signed_in(StubAdvisor::new(None, None));
    let id = created(&mut engine, "Focus", 600).await;
    engine.start_task(&id, None).unwrap();
    for _ in 0..17 {
        engine.tick().await;
    }
    let left = engine.timer().time_left();
    assert_eq!(left, 583);

    assert!(engine.pause());
    engine.tick().await;
    assert!(engine.resume());
    assert_eq!(engine.timer().time_left(), left);
}

#[tokio::test]
async fn sign_in_loads_stored_forest_and_sign_out_detaches() {
    let store = MemoryStore::new();
    let user = UserIdentity::new("returning");
    store.set_remote(&user, Some(vec![Task::new("Saved", 900)]));

    let mut engine = SessionEngine::new(
        StubAdvisor::new(None, None),
        Box::new(store.clone()),
        SETTINGS,
    );
    assert_eq!(engine.active_task_name(), "Login to start");
    engine.sign_in(&mut StaticAuth::user("returning"));
    assert_eq!(engine.tree().len(), 1);
    assert_eq!(engine.active_task_name(), "Select a task");
    assert_eq!(engine.total_remaining_time(), 900);

    engine.sign_out(&mut StaticAuth::user("returning"));
    assert!(engine.tree().is_empty());

    store.set_remote(&user, Some(vec![Task::new("Later", 60)]));
    assert!(!engine.poll_store());
    assert!(engine.tree().is_empty());
}

#[tokio::test]
async fn snapshot_reports_active_task_progress() {
    let (mut engine, _) = signed_in(StubAdvisor::new(None, None));
    let id = created(&mut engine, "Slides", 100).await;
    engine.start_task(&id, None).unwrap();
    for _ in 0..25 {
        engine.tick().await;
    }
    match engine.snapshot() {
        Event::StateSnapshot {
            state,
            task_name,
            remaining_secs,
            total_secs,
            progress,
            ..
        } => {
            assert_eq!(state, TimerState::Running);
            assert_eq!(task_name, "Slides");
            assert_eq!(remaining_secs, 75);
            assert_eq!(total_secs, 100);
            assert_eq!(progress, 0.25);
        }
        other => panic!("Expected StateSnapshot, got {other:?}"),
    }
}
