//! Advisory collaborators.
//!
//! Two non-binding recommendations feed the session flow:
//!
//! - **Division**: should a long task be split into pomodoro-sized parts?
//! - **Completion**: when a work session ends, is the task done, does it
//!   need a few more minutes, or is it time for a break anyway?
//!
//! Responses are untrusted JSON. They are parsed into strongly typed values
//! here and any schema violation becomes an [`AdvisoryError`]; the engine
//! then falls back to the safe default (keep the task whole / take a break).

mod generative;
mod rules;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::AdvisoryError;

pub use generative::GenerativeAdvisor;
pub use rules::{RuleAdvisor, DIVISION_THRESHOLD_MINUTES};

/// Which advisory a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvisoryKind {
    Division,
    Completion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivisionRequest {
    pub task_name: String,
    pub task_duration_minutes: f64,
}

impl DivisionRequest {
    pub fn new(task_name: impl Into<String>, duration_secs: u64) -> Self {
        Self {
            task_name: task_name.into(),
            task_duration_minutes: duration_secs as f64 / 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivisionSuggestion {
    pub should_divide: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl DivisionSuggestion {
    /// Used when the advisory could not be obtained.
    pub fn fallback() -> Self {
        Self {
            should_divide: false,
            reasoning: Some("An error occurred while getting suggestion.".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub task_name: String,
}

/// Validated completion recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompletionVerdict {
    /// Mark the task done and take a break.
    Complete,
    /// Take a break without marking the task.
    Incomplete,
    /// Keep working on the same task for a few more minutes.
    AddTime { minutes: u32 },
}

impl CompletionVerdict {
    /// Used when the advisory could not be obtained.
    pub const FALLBACK: CompletionVerdict = CompletionVerdict::Incomplete;
}

/// Completion response exactly as the collaborator sends it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCompletion {
    pub completion_status: String,
    #[serde(default)]
    pub additional_time: Option<f64>,
}

impl TryFrom<RawCompletion> for CompletionVerdict {
    type Error = AdvisoryError;

    fn try_from(raw: RawCompletion) -> Result<Self, Self::Error> {
        match raw.completion_status.as_str() {
            "complete" => Ok(CompletionVerdict::Complete),
            "incomplete" => Ok(CompletionVerdict::Incomplete),
            "add_time" => match raw.additional_time {
                Some(minutes) if minutes.is_finite() && minutes.round() >= 1.0 => {
                    Ok(CompletionVerdict::AddTime {
                        minutes: minutes.round().min(u32::MAX as f64) as u32,
                    })
                }
                other => Err(AdvisoryError::Malformed(format!(
                    "add_time requires a positive additionalTime, got {other:?}"
                ))),
            },
            other => Err(AdvisoryError::Malformed(format!(
                "unknown completionStatus '{other}'"
            ))),
        }
    }
}

/// A source of division and completion advice.
pub trait Advisor {
    fn suggest_division(
        &self,
        request: &DivisionRequest,
    ) -> impl Future<Output = Result<DivisionSuggestion, AdvisoryError>>;

    fn evaluate_completion(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionVerdict, AdvisoryError>>;
}

/// Advisor chosen from configuration at runtime.
pub enum ConfiguredAdvisor {
    Rules(RuleAdvisor),
    Generative(GenerativeAdvisor),
}

impl Advisor for ConfiguredAdvisor {
    async fn suggest_division(
        &self,
        request: &DivisionRequest,
    ) -> Result<DivisionSuggestion, AdvisoryError> {
        match self {
            ConfiguredAdvisor::Rules(rules) => rules.suggest_division(request).await,
            ConfiguredAdvisor::Generative(client) => client.suggest_division(request).await,
        }
    }

    async fn evaluate_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionVerdict, AdvisoryError> {
        match self {
            ConfiguredAdvisor::Rules(rules) => rules.evaluate_completion(request).await,
            ConfiguredAdvisor::Generative(client) => client.evaluate_completion(request).await,
        }
    }
}
