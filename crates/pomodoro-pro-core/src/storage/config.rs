//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default work and break lengths
//! - Which advisor to consult and how to reach it
//! - Notification sounds
//! - The profile used by `auth login`
//!
//! Configuration is stored at `<data dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{data_dir, keyring_store};
use crate::advisory::{ConfiguredAdvisor, GenerativeAdvisor, RuleAdvisor};
use crate::engine::Settings;
use crate::error::{AdvisoryError, ConfigError};

/// Keyring entry consulted when the API key variable is unset.
const API_KEY_ENTRY: &str = "advisory_api_key";

/// Default session lengths, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work_duration")]
    pub work_duration: u64,
    #[serde(default = "default_break_duration")]
    pub break_duration: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvisoryProvider {
    Rules,
    Generative,
}

/// Advisory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryConfig {
    #[serde(default = "default_provider")]
    pub provider: AdvisoryProvider,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ring the terminal bell when a session ends.
    #[serde(default = "default_true")]
    pub bell: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub default_user: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub advisory: AdvisoryConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

// Default functions
fn default_work_duration() -> u64 {
    25 * 60
}
fn default_break_duration() -> u64 {
    5 * 60
}
fn default_provider() -> AdvisoryProvider {
    AdvisoryProvider::Rules
}
fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_model() -> String {
    "gemini-2.0-flash".into()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_duration: default_work_duration(),
            break_duration: default_break_duration(),
        }
    }
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bell: true,
        }
    }
}

impl AdvisoryConfig {
    /// API key from the configured environment variable, then the keyring.
    pub fn api_key(&self) -> Option<String> {
        if let Some(key) = std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
        {
            return Some(key);
        }
        match keyring_store::get(API_KEY_ENTRY) {
            Ok(key) => key,
            Err(e) => {
                tracing::debug!(error = %e, "keyring lookup for advisory key failed");
                None
            }
        }
    }

    /// Save `key` to the keyring for use when the variable is unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a blank key and
    /// [`ConfigError::Keyring`] if the keyring rejects it.
    pub fn store_api_key(key: &str) -> Result<(), ConfigError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: API_KEY_ENTRY.to_string(),
                message: "API key must not be empty".to_string(),
            });
        }
        keyring_store::set(API_KEY_ENTRY, key)?;
        Ok(())
    }

    /// Remove the keyring copy of the API key. Missing entries are fine.
    pub fn clear_api_key() -> Result<(), ConfigError> {
        keyring_store::delete(API_KEY_ENTRY)?;
        Ok(())
    }

    /// Build the configured advisor.
    ///
    /// # Errors
    ///
    /// Returns [`AdvisoryError::NotConfigured`] if the generative provider is
    /// selected but no API key can be found or the endpoint is invalid.
    pub fn build_advisor(&self) -> Result<ConfiguredAdvisor, AdvisoryError> {
        match self.provider {
            AdvisoryProvider::Rules => Ok(ConfiguredAdvisor::Rules(RuleAdvisor)),
            AdvisoryProvider::Generative => {
                let api_key = self.api_key().ok_or_else(|| {
                    AdvisoryError::NotConfigured(format!(
                        "set {} or store '{API_KEY_ENTRY}' in the keyring",
                        self.api_key_env
                    ))
                })?;
                let client = GenerativeAdvisor::new(
                    &self.endpoint,
                    &self.model,
                    api_key,
                    Duration::from_secs(self.timeout_secs),
                )?;
                Ok(ConfiguredAdvisor::Generative(client))
            }
        }
    }

    /// Like [`build_advisor`](Self::build_advisor), but falls back to the
    /// offline rules when the generative provider cannot be set up.
    pub fn advisor_or_rules(&self) -> ConfiguredAdvisor {
        self.build_advisor().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to rule-based advisor");
            ConfiguredAdvisor::Rules(RuleAdvisor)
        })
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Optional strings serialize as null until first set.
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// `<data dir>/config.toml`.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Call [`save`](Self::save) to
    /// persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Every leaf key with its current value, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    /// Session lengths the engine starts with.
    pub fn settings(&self) -> Settings {
        Settings {
            work_duration: self.timer.work_duration,
            break_duration: self.timer.break_duration,
        }
    }
}
