//! Offline advisor applying the documented division policy.

use super::{Advisor, CompletionRequest, CompletionVerdict, DivisionRequest, DivisionSuggestion};
use crate::error::AdvisoryError;

/// Tasks strictly longer than this are worth splitting.
pub const DIVISION_THRESHOLD_MINUTES: f64 = 60.0;

/// Deterministic advisor used when no generative service is configured.
///
/// Division follows the threshold policy; completion always suggests a
/// break without marking the task, since nothing can be inferred offline.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleAdvisor;

impl Advisor for RuleAdvisor {
    async fn suggest_division(
        &self,
        request: &DivisionRequest,
    ) -> Result<DivisionSuggestion, AdvisoryError> {
        let minutes = request.task_duration_minutes;
        if minutes > DIVISION_THRESHOLD_MINUTES {
            Ok(DivisionSuggestion {
                should_divide: true,
                reasoning: Some(format!(
                    "At {minutes:.0} minutes, \"{}\" is longer than an hour; shorter sessions keep focus fresh.",
                    request.task_name
                )),
            })
        } else {
            Ok(DivisionSuggestion {
                should_divide: false,
                reasoning: Some("The task fits comfortably in a single sitting.".to_string()),
            })
        }
    }

    async fn evaluate_completion(
        &self,
        _request: &CompletionRequest,
    ) -> Result<CompletionVerdict, AdvisoryError> {
        Ok(CompletionVerdict::Incomplete)
    }
}
