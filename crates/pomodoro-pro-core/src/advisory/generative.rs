//! HTTP advisor backed by a `generateContent` text-generation API.

use std::time::Duration;

use indoc::formatdoc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::{
    Advisor, CompletionRequest, CompletionVerdict, DivisionRequest, DivisionSuggestion,
    RawCompletion,
};
use crate::error::AdvisoryError;

pub struct GenerativeAdvisor {
    http_client: Client,
    url: Url,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerativeAdvisor {
    /// Build a client for `{endpoint}/v1beta/models/{model}:generateContent`.
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AdvisoryError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(AdvisoryError::NotConfigured("missing API key".into()));
        }
        if model.is_empty() {
            return Err(AdvisoryError::NotConfigured("missing model name".into()));
        }

        let mut base = endpoint.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let url = Url::parse(&base)
            .and_then(|base| base.join(&format!("v1beta/models/{model}:generateContent")))
            .map_err(|e| AdvisoryError::NotConfigured(format!("invalid endpoint '{endpoint}': {e}")))?;

        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            url,
            api_key,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Send one prompt and decode the JSON carried in the first candidate.
    async fn generate<T: DeserializeOwned>(&self, prompt: String) -> Result<T, AdvisoryError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": "application/json" },
        });

        let resp = self
            .http_client
            .post(self.url.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AdvisoryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = resp.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .find_map(|part| part.text)
            .ok_or(AdvisoryError::MissingContent)?;

        Ok(serde_json::from_str(strip_code_fence(&text))?)
    }
}

impl Advisor for GenerativeAdvisor {
    async fn suggest_division(
        &self,
        request: &DivisionRequest,
    ) -> Result<DivisionSuggestion, AdvisoryError> {
        let prompt = formatdoc! {r#"
            You advise people on whether to divide a task into smaller work sessions.

            The task "{name}" will take {minutes} minutes. Should it be divided into smaller sessions?

            Respond with a JSON object with a boolean field "shouldDivide". Answer true when the
            task is longer than 60 minutes and false otherwise. Also include a string field
            "reasoning" explaining the decision in one sentence."#,
            name = request.task_name,
            minutes = request.task_duration_minutes,
        };
        self.generate(prompt).await
    }

    async fn evaluate_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionVerdict, AdvisoryError> {
        let prompt = formatdoc! {r#"
            The timer has run out for the task "{name}".
            Judging only from the task name, decide whether it is probably finished or needs more time.

            Respond with a JSON object containing a "completionStatus" field set to one of:
            - "complete": the task is probably finished.
            - "incomplete": the task is probably not finished, but a break is a good idea now.
            - "add_time": a few more minutes should wrap it up.

            When answering "add_time", also include "additionalTime" with the number of extra
            minutes (for example 5 or 10)."#,
            name = request.task_name,
        };
        let raw: RawCompletion = self.generate(prompt).await?;
        CompletionVerdict::try_from(raw)
    }
}

/// Models sometimes wrap JSON in a Markdown code fence.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
