mod config;

pub use config::{AdvisoryConfig, AdvisoryProvider, AuthConfig, Config, NotificationsConfig, TimerConfig};

use std::path::{Path, PathBuf};

/// Directory holding `config.toml`, `session.json` and `tasks/`.
///
/// `POMODORO_PRO_HOME` wins when set. Otherwise `~/.config/pomodoro-pro`,
/// or `~/.config/pomodoro-pro-dev` with `POMODORO_PRO_ENV=dev`. The
/// directory is created if missing.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let home_override = std::env::var_os("POMODORO_PRO_HOME").map(PathBuf::from);
    let env = std::env::var("POMODORO_PRO_ENV").ok();
    let dir = resolve_data_dir(home_override, env.as_deref(), dirs::home_dir());
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn resolve_data_dir(home_override: Option<PathBuf>, env: Option<&str>, home: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = home_override.filter(|dir| !dir.as_os_str().is_empty()) {
        return dir;
    }
    let base_dir = home.unwrap_or_else(|| PathBuf::from(".")).join(".config");
    if env == Some("dev") {
        base_dir.join("pomodoro-pro-dev")
    } else {
        base_dir.join("pomodoro-pro")
    }
}

/// Per-user task files live here.
pub fn tasks_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("tasks")
}

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    const SERVICE: &str = "pomodoro-pro";

    pub fn get(key: &str) -> Result<Option<String>, keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), keyring::Error> {
        keyring::Entry::new(SERVICE, key)?.set_password(value)
    }

    pub fn delete(key: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins() {
        let dir = resolve_data_dir(Some("/tmp/pp".into()), Some("dev"), Some("/home/u".into()));
        assert_eq!(dir, PathBuf::from("/tmp/pp"));
    }

    #[test]
    fn env_selects_dev_directory() {
        let home = Some(PathBuf::from("/home/u"));
        assert_eq!(
            resolve_data_dir(None, None, home.clone()),
            PathBuf::from("/home/u/.config/pomodoro-pro")
        );
        assert_eq!(
            resolve_data_dir(Some(PathBuf::new()), Some("dev"), home),
            PathBuf::from("/home/u/.config/pomodoro-pro-dev")
        );
    }
}
