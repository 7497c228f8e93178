//! Foreground work sessions.

use std::io::Write;

use clap::Subcommand;
use pomodoro_pro_core::task::MAX_DURATION_SECS;
use pomodoro_pro_core::{
    drive, format_clock, format_duration, Answer, Event, Prompt, PromptResolver, TaskId,
    TimerMode,
};

use super::{block_on, confirm, print_notices, CliResult, Context};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Work on a task until the following break is over
    Run {
        /// Task ID
        task_id: String,
        /// Override the session length in minutes
        #[arg(long)]
        minutes: Option<u64>,
        /// Accept every suggestion without asking
        #[arg(long, short)]
        yes: bool,
    },
    /// Render a number of seconds the way the timer shows it
    Format {
        seconds: u64,
        /// Use the task-list style (`1h 30m`) instead of a clock
        #[arg(long)]
        compact: bool,
    },
}

pub fn run(action: TimerAction) -> CliResult {
    match action {
        TimerAction::Run {
            task_id,
            minutes,
            yes,
        } => {
            let ctx = Context::load()?;
            let mut engine = ctx.signed_in_engine()?;
            let duration = match minutes {
                Some(minutes) => Some(
                    minutes
                        .checked_mul(60)
                        .filter(|secs| (1..=MAX_DURATION_SECS).contains(secs))
                        .ok_or_else(|| {
                            format!("--minutes must be between 1 and {}", MAX_DURATION_SECS / 60)
                        })?,
                ),
                None => None,
            };
            let id = TaskId::from(task_id);
            engine.start_task(&id, duration)?;
            tracing::info!(task = %id, "session started");

            let mut resolver = TerminalResolver { auto_confirm: yes };
            resolver.observe(engine.drain_events());
            block_on(drive(&mut engine, &mut resolver))?;
            eprintln!();
        }
        TimerAction::Format { seconds, compact } => {
            if compact {
                println!("{}", format_duration(seconds));
            } else {
                println!("{}", format_clock(seconds));
            }
        }
    }
    Ok(())
}

/// Asks on the terminal and redraws a one-line countdown on stderr.
struct TerminalResolver {
    auto_confirm: bool,
}

impl PromptResolver for TerminalResolver {
    async fn resolve(&mut self, prompt: &Prompt) -> Answer {
        eprintln!();
        eprintln!("{}", prompt.title());
        eprintln!("{}", prompt.message());
        if self.auto_confirm {
            eprintln!("-> {}", prompt.confirm_label());
            return Answer::Confirm;
        }
        if confirm(&format!("{}?", prompt.confirm_label())) {
            Answer::Confirm
        } else {
            eprintln!("-> {}", prompt.cancel_label());
            Answer::Cancel
        }
    }

    fn observe(&mut self, events: Vec<Event>) {
        let (notices, rest): (Vec<_>, Vec<_>) = events
            .into_iter()
            .partition(|event| matches!(event, Event::Notice { .. }));
        if !notices.is_empty() {
            eprintln!();
            print_notices(&notices);
        }
        for event in rest {
            if let Event::StateSnapshot {
                mode,
                task_name,
                remaining_secs,
                ..
            } = event
            {
                let label = match mode {
                    TimerMode::Work => "Work",
                    TimerMode::Break => "Break",
                };
                let mut err = std::io::stderr().lock();
                let _ = write!(err, "\r{label} {}  {task_name}\x1b[K", format_clock(remaining_secs));
                let _ = err.flush();
            }
        }
    }
}
