//! File-backed profile sign-in for the terminal front end.
//!
//! Signing in records the chosen profile in `session.json` inside the data
//! directory so later invocations can restore it.

use std::fs;
use std::path::{Path, PathBuf};

use super::{AuthProvider, UserIdentity};
use crate::error::AuthError;

const SESSION_FILE: &str = "session.json";

pub struct LocalProfileAuth {
    dir: PathBuf,
    profile: Option<String>,
}

impl LocalProfileAuth {
    /// `profile` is the name to sign in as; an empty name means the user
    /// declined to enter one.
    pub fn new(dir: impl Into<PathBuf>, profile: Option<String>) -> Self {
        Self {
            dir: dir.into(),
            profile,
        }
    }

    /// Identity recorded by the last successful sign-in, if any.
    pub fn restore(dir: &Path) -> Option<UserIdentity> {
        let content = fs::read_to_string(dir.join(SESSION_FILE)).ok()?;
        match serde_json::from_str(&content) {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable session file");
                None
            }
        }
    }

    fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }
}

fn valid_profile(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        && !name.starts_with('.')
}

impl AuthProvider for LocalProfileAuth {
    fn sign_in(&mut self) -> Result<UserIdentity, AuthError> {
        let name = match self.profile.as_deref().map(str::trim) {
            None => return Err(AuthError::NoProfile),
            Some("") => return Err(AuthError::Dismissed),
            Some(name) => name.to_string(),
        };
        if !valid_profile(&name) {
            return Err(AuthError::Failed(format!("invalid profile name '{name}'")));
        }

        let identity = UserIdentity {
            uid: name.clone(),
            display_name: Some(name),
        };
        let json = serde_json::to_string_pretty(&identity)
            .map_err(|e| AuthError::Failed(e.to_string()))?;
        fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(self.session_path(), json))
            .map_err(|e| AuthError::Failed(format!("cannot record session: {e}")))?;
        Ok(identity)
    }

    fn sign_out(&mut self) -> Result<(), AuthError> {
        match fs::remove_file(self.session_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Failed(format!("cannot clear session: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sign_in_persists_and_restores() {
        let dir = TempDir::new().unwrap();
        let mut auth = LocalProfileAuth::new(dir.path(), Some("alice".into()));
        let identity = auth.sign_in().unwrap();
        assert_eq!(identity.uid, "alice");
        assert_eq!(LocalProfileAuth::restore(dir.path()), Some(identity));

        auth.sign_out().unwrap();
        assert_eq!(LocalProfileAuth::restore(dir.path()), None);
        auth.sign_out().unwrap();
    }

    #[test]
    fn empty_name_is_dismissed_and_missing_is_no_profile() {
        let dir = TempDir::new().unwrap();
        let err = LocalProfileAuth::new(dir.path(), Some("  ".into()))
            .sign_in()
            .unwrap_err();
        assert!(err.is_dismissed());

        let err = LocalProfileAuth::new(dir.path(), None).sign_in().unwrap_err();
        assert_eq!(err, AuthError::NoProfile);
    }

    #[test]
    fn rejects_path_like_names() {
        let dir = TempDir::new().unwrap();
        for name in ["../evil", "a/b", ".hidden"] {
            let err = LocalProfileAuth::new(dir.path(), Some(name.into()))
                .sign_in()
                .unwrap_err();
            assert!(matches!(err, AuthError::Failed(_)), "{name}");
        }
    }
}
