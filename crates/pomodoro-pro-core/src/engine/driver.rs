//! Async loop running a session to its next resting point.

use crate::advisory::Advisor;
use crate::task::Task;
use crate::timer::Ticker;

use super::{PromptResolver, SessionEngine};

enum Step {
    Tick,
    Snapshot(Vec<Task>),
}

/// Drive `engine` until the timer is neither running nor expired and no
/// prompt is pending.
///
/// Keeps a single [`Ticker`] in step with the timer, applies store pushes
/// while waiting for the next second and hands every prompt to `resolver`.
/// Events are drained after each step and passed to
/// [`PromptResolver::observe`], followed by a state snapshot after a tick.
pub async fn drive<A: Advisor, R: PromptResolver>(engine: &mut SessionEngine<A>, resolver: &mut R) {
    let mut ticker = Ticker::new();
    loop {
        if let Some(prompt) = engine.pending_prompt().cloned() {
            let answer = resolver.resolve(&prompt).await;
            tracing::debug!(?answer, prompt = prompt.title(), "prompt answered");
            engine.answer_prompt(answer);
            resolver.observe(engine.drain_events());
            continue;
        }

        ticker.sync(engine.timer());
        if !ticker.is_armed() {
            resolver.observe(engine.drain_events());
            return;
        }

        let step = tokio::select! {
            _ = ticker.tick() => Step::Tick,
            forest = engine.next_store_push() => Step::Snapshot(forest),
        };
        match step {
            Step::Tick => {
                engine.tick().await;
                let mut events = engine.drain_events();
                events.push(engine.snapshot());
                resolver.observe(events);
            }
            Step::Snapshot(forest) => {
                engine.apply_snapshot(forest);
                resolver.observe(engine.drain_events());
            }
        }
    }
}
