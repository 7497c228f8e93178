//! Confirmation prompts raised by the engine.
//!
//! A prompt holds everything needed to apply or refuse an advisory once the
//! user answers. Only ids and plain values are stored; the engine resolves
//! them against the tree as it is when the answer arrives.

use std::collections::VecDeque;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::advisory::CompletionVerdict;
use crate::events::Event;
use crate::task::TaskId;
use crate::timer::format_clock;

/// "Split this long task into sessions?"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionPrompt {
    pub task_name: String,
    /// Requested duration in seconds.
    pub duration: u64,
    pub reasoning: Option<String>,
}

impl DivisionPrompt {
    pub fn title(&self) -> &'static str {
        "Suggestion: Large Task"
    }

    pub fn message(&self) -> String {
        let mut message = format!(
            "Your task \"{}\" is estimated to take {}. That's longer than a typical Pomodoro session.",
            self.task_name,
            format_clock(self.duration)
        );
        if let Some(reasoning) = &self.reasoning {
            message.push_str(&format!("\nSuggestion: {reasoning}"));
        }
        message.push_str("\nWould you like to split it into multiple 25-minute Pomodoro sessions?");
        message
    }
}

/// "Time's up. Is the task done?"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionPrompt {
    pub task_id: TaskId,
    pub task_name: String,
    pub verdict: CompletionVerdict,
}

impl CompletionPrompt {
    pub fn title(&self) -> &'static str {
        "Session Complete!"
    }

    pub fn message(&self) -> String {
        let advice = match self.verdict {
            CompletionVerdict::AddTime { minutes } => format!(
                "This task might need more time. Would you like to add an extra {minutes} minutes?"
            ),
            CompletionVerdict::Complete => {
                "This task looks complete. Let's take a break.".to_string()
            }
            CompletionVerdict::Incomplete => {
                "This task may not be complete, but let's take a break for now.".to_string()
            }
        };
        format!("Time's up for \"{}\".\n{advice}", self.task_name)
    }

    pub fn confirm_label(&self) -> &'static str {
        match self.verdict {
            CompletionVerdict::AddTime { .. } => "Add Time",
            _ => "Mark as Complete & Break",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Prompt {
    Division(DivisionPrompt),
    Completion(CompletionPrompt),
}

impl Prompt {
    pub fn title(&self) -> &'static str {
        match self {
            Prompt::Division(p) => p.title(),
            Prompt::Completion(p) => p.title(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            Prompt::Division(p) => p.message(),
            Prompt::Completion(p) => p.message(),
        }
    }

    pub fn confirm_label(&self) -> &'static str {
        match self {
            Prompt::Division(_) => "Split Task",
            Prompt::Completion(p) => p.confirm_label(),
        }
    }

    pub fn cancel_label(&self) -> &'static str {
        match self {
            Prompt::Division(_) => "Add as-is",
            Prompt::Completion(_) => "Dismiss",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Confirm,
    /// Also what closing the prompt without choosing means.
    Cancel,
}

/// Answers prompts on behalf of a front end and observes what `drive` does.
pub trait PromptResolver {
    fn resolve(&mut self, prompt: &Prompt) -> impl Future<Output = Answer>;

    /// Events drained by `drive`, plus a state snapshot after every tick.
    fn observe(&mut self, _events: Vec<Event>) {}
}

/// Confirms everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl PromptResolver for AutoConfirm {
    async fn resolve(&mut self, _prompt: &Prompt) -> Answer {
        Answer::Confirm
    }
}

/// Replays fixed answers in order, cancelling once they run out. Records
/// every prompt and event it sees.
#[derive(Debug, Default)]
pub struct ScriptedResolver {
    answers: VecDeque<Answer>,
    pub prompts: Vec<Prompt>,
    pub events: Vec<Event>,
}

impl ScriptedResolver {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            prompts: Vec::new(),
            events: Vec::new(),
        }
    }
}

impl PromptResolver for ScriptedResolver {
    async fn resolve(&mut self, prompt: &Prompt) -> Answer {
        self.prompts.push(prompt.clone());
        self.answers.pop_front().unwrap_or(Answer::Cancel)
    }

    fn observe(&mut self, events: Vec<Event>) {
        self.events.extend(events);
    }
}
