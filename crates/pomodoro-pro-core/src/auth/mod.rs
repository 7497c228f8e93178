//! Authentication collaborator.
//!
//! A provider turns a sign-in request into a [`UserIdentity`]. The identity
//! is only used as the key of the user's task forest in the store.

mod local;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

pub use local::LocalProfileAuth;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl UserIdentity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
        }
    }

    /// Store key holding this user's forest.
    pub fn tasks_key(&self) -> String {
        format!("tasks/{}", self.uid)
    }
}

pub trait AuthProvider {
    /// Interactive sign-in. `AuthError::Dismissed` means the user backed
    /// out and must not be reported as a failure.
    fn sign_in(&mut self) -> Result<UserIdentity, AuthError>;

    fn sign_out(&mut self) -> Result<(), AuthError>;
}

/// Provider with a fixed sign-in outcome.
#[derive(Debug, Clone)]
pub struct StaticAuth {
    outcome: Result<UserIdentity, AuthError>,
    sign_out_error: Option<AuthError>,
    sign_outs: usize,
}

impl StaticAuth {
    pub fn user(uid: impl Into<String>) -> Self {
        Self {
            outcome: Ok(UserIdentity::new(uid)),
            sign_out_error: None,
            sign_outs: 0,
        }
    }

    pub fn dismissed() -> Self {
        Self::failing(AuthError::Dismissed)
    }

    pub fn failing(error: AuthError) -> Self {
        Self {
            outcome: Err(error),
            sign_out_error: None,
            sign_outs: 0,
        }
    }

    pub fn with_sign_out_error(mut self, error: AuthError) -> Self {
        self.sign_out_error = Some(error);
        self
    }

    /// How many times `sign_out` was called.
    pub fn sign_outs(&self) -> usize {
        self.sign_outs
    }
}

impl AuthProvider for StaticAuth {
    fn sign_in(&mut self) -> Result<UserIdentity, AuthError> {
        self.outcome.clone()
    }

    fn sign_out(&mut self) -> Result<(), AuthError> {
        self.sign_outs += 1;
        match &self.sign_out_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}
