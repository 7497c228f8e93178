//! Core error types for pomodoro-pro-core.
//!
//! Every collaborator has its own error enum; `CoreError` aggregates them
//! for callers that do not care which seam failed. None of these are fatal
//! to a session: the engine recovers from advisory and sync failures with a
//! documented fallback and only reports them.

use std::path::PathBuf;
use thiserror::Error;

use crate::task::TaskId;

/// Core error type for pomodoro-pro-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Authentication-related errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Advisory collaborator errors
    #[error("Advisory error: {0}")]
    Advisory(#[from] AdvisoryError),

    /// Store synchronization errors
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task lookup errors
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// A confirmation prompt is still waiting for an answer
    #[error("A suggestion is still waiting for confirmation")]
    PromptPending,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Authentication errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The user closed the sign-in flow. Callers treat this as a silent no-op.
    #[error("Sign-in dismissed by user")]
    Dismissed,

    /// No profile name was supplied and none is configured
    #[error("No profile configured for sign-in")]
    NoProfile,

    /// Any other provider failure
    #[error("Sign-in failed: {0}")]
    Failed(String),
}

impl AuthError {
    pub fn is_dismissed(&self) -> bool {
        matches!(self, AuthError::Dismissed)
    }
}

/// Errors from the division/completion advisory collaborators.
#[derive(Error, Debug)]
pub enum AdvisoryError {
    /// Transport failure
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Advisory service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response carried no candidate text
    #[error("Advisory response contained no content")]
    MissingContent,

    /// The response parsed but violated the advisory schema
    #[error("Malformed advisory response: {0}")]
    Malformed(String),

    /// The response was not valid JSON
    #[error("Invalid advisory JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing endpoint, model or API key
    #[error("Advisory service not configured: {0}")]
    NotConfigured(String),
}

/// Store synchronization errors.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The store side of a subscription went away
    #[error("Store subscription closed")]
    Closed,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// The system keyring could not be reached
    #[error("Keyring access failed: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Task lookup errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(TaskId),

    #[error("duration of {secs}s is longer than the {max}s limit")]
    TooLong { secs: u64, max: u64 },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
