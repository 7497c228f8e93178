//! Task management commands for CLI.

use chrono::{Local, Utc};
use clap::{Args, Subcommand};
use pomodoro_pro_core::task::MAX_DURATION_SECS;
use pomodoro_pro_core::{
    format_duration, AddTaskOutcome, ConfiguredAdvisor, SessionEngine, Task, TaskError, TaskId,
};

use super::{block_on, confirm, print_notices, CliResult, Context};

#[derive(Args, Clone, Copy)]
pub struct DurationArgs {
    /// Hours
    #[arg(long, default_value_t = 0)]
    hours: u64,
    /// Minutes
    #[arg(long, default_value_t = 0)]
    minutes: u64,
    /// Seconds
    #[arg(long, default_value_t = 0)]
    seconds: u64,
}

impl DurationArgs {
    fn total(self) -> CliResult<u64> {
        let total = self
            .hours
            .checked_mul(3600)
            .and_then(|secs| secs.checked_add(self.minutes.checked_mul(60)?))
            .and_then(|secs| secs.checked_add(self.seconds))
            .filter(|secs| *secs <= MAX_DURATION_SECS)
            .ok_or_else(|| {
                format!("duration must be at most {}", format_duration(MAX_DURATION_SECS))
            })?;
        if total == 0 {
            return Err("duration must be greater than zero".into());
        }
        Ok(total)
    }
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a root task
    Add {
        /// Task text
        text: String,
        #[command(flatten)]
        duration: DurationArgs,
        /// Accept a suggested split without asking
        #[arg(long, conflicts_with = "no_split")]
        split: bool,
        /// Refuse a suggested split without asking
        #[arg(long)]
        no_split: bool,
    },
    /// Add a subtask under an existing task
    Sub {
        /// Parent task ID
        parent: String,
        /// Subtask text
        text: String,
        #[command(flatten)]
        duration: DurationArgs,
    },
    /// Flip a task between active and completed
    Toggle {
        /// Task ID
        id: String,
    },
    /// Delete a task and all of its subtasks
    Delete {
        /// Task ID
        id: String,
    },
    /// Print one task with its subtasks as JSON
    Show {
        /// Task ID
        id: String,
    },
    /// List tasks
    List {
        /// Print the raw forest as JSON
        #[arg(long)]
        json: bool,
    },
}

fn non_empty(text: &str) -> CliResult<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err("task text is empty".into());
    }
    Ok(text)
}

pub fn run(action: TaskAction) -> CliResult {
    let ctx = Context::load()?;

    match action {
        TaskAction::Add {
            text,
            duration,
            split,
            no_split,
        } => {
            let text = non_empty(&text)?;
            let duration = duration.total()?;
            let mut engine = ctx.signed_in_engine()?;
            let outcome = block_on(engine.add_task(text, duration))??;
            let id = match outcome {
                AddTaskOutcome::Created(id) => Some(id),
                AddTaskOutcome::AwaitingConfirmation => {
                    let accept = split || (!no_split && ask_division(&engine));
                    if accept {
                        engine.confirm_division()
                    } else {
                        engine.cancel_division()
                    }
                }
                AddTaskOutcome::SignInRequired => {
                    print_notices(&engine.drain_events());
                    return Err("not logged in".into());
                }
            };
            print_notices(&engine.drain_events());
            match id {
                Some(id) => {
                    println!("Task created: {id}");
                    if let Some(task) = engine.tree().find(&id) {
                        print_task(&task, 0);
                    }
                }
                None => return Err("task was not created".into()),
            }
        }
        TaskAction::Sub {
            parent,
            text,
            duration,
        } => {
            let text = non_empty(&text)?;
            let duration = duration.total()?;
            let mut engine = ctx.signed_in_engine()?;
            let parent = TaskId::from(parent);
            let id = engine
                .add_subtask(&parent, text, duration)
                .ok_or_else(|| TaskError::NotFound(parent.clone()))?;
            println!("Task created: {id}");
        }
        TaskAction::Toggle { id } => {
            let mut engine = ctx.signed_in_engine()?;
            let id = TaskId::from(id);
            let completed = engine
                .toggle_task(&id)
                .ok_or_else(|| TaskError::NotFound(id.clone()))?;
            println!("{id}: {}", if completed { "completed" } else { "active" });
        }
        TaskAction::Delete { id } => {
            let mut engine = ctx.signed_in_engine()?;
            let id = TaskId::from(id);
            let removed = engine
                .delete_task(&id)
                .ok_or_else(|| TaskError::NotFound(id.clone()))?;
            println!("Deleted {removed} task(s)");
        }
        TaskAction::Show { id } => {
            let engine = ctx.signed_in_engine()?;
            let task = engine.tree().require(&TaskId::from(id))?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::List { json } => {
            let engine = ctx.signed_in_engine()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&engine.tree().to_forest())?);
            } else {
                print_list(&engine);
            }
        }
    }
    Ok(())
}

fn ask_division(engine: &SessionEngine<ConfiguredAdvisor>) -> bool {
    let Some(prompt) = engine.pending_prompt() else {
        return false;
    };
    eprintln!("{}", prompt.title());
    eprintln!("{}", prompt.message());
    confirm(&format!("{}?", prompt.confirm_label()))
}

fn print_task(task: &Task, depth: usize) {
    let mark = if task.completed { "x" } else { " " };
    println!(
        "{:indent$}[{mark}] {}  {}  ({})",
        "",
        task.text,
        format_duration(task.duration),
        task.id,
        indent = depth * 2
    );
    for sub in &task.subtasks {
        print_task(sub, depth + 1);
    }
}

fn print_list(engine: &SessionEngine<ConfiguredAdvisor>) {
    let tree = engine.tree();
    if tree.is_empty() {
        println!("No tasks yet.");
        return;
    }

    for task in tree.active_roots() {
        print_task(&task, 0);
    }
    let completed = tree.completed_roots();
    if !completed.is_empty() {
        println!();
        println!("Completed Tasks ({})", completed.len());
        for task in &completed {
            print_task(task, 0);
        }
    }

    let break_duration = engine.settings().break_duration;
    let remaining = tree.total_remaining_time(break_duration);
    let finish = tree.finish_at(Utc::now(), break_duration).with_timezone(&Local);
    println!();
    println!(
        "Total remaining: {} (done around {})",
        format_duration(remaining),
        finish.format("%H:%M")
    );
}
