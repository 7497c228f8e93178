//! Subcommand implementations and the state they share.

pub mod auth;
pub mod config;
pub mod task;
pub mod timer;

use std::error::Error;
use std::future::Future;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use pomodoro_pro_core::storage::tasks_dir;
use pomodoro_pro_core::{
    data_dir, BellNotifier, Config, ConfiguredAdvisor, Event, FileStore, LocalProfileAuth,
    NoticeLevel, SessionEngine,
};

pub type CliResult<T = ()> = Result<T, Box<dyn Error>>;

/// Data directory plus the configuration loaded from it.
pub struct Context {
    pub dir: PathBuf,
    pub config: Config,
}

impl Context {
    pub fn load() -> CliResult<Self> {
        let dir = data_dir()?;
        let config = Config::load()?;
        Ok(Self { dir, config })
    }

    /// Engine over the on-disk store, with the saved session restored when
    /// its tasks can be read.
    pub fn engine(&self) -> CliResult<SessionEngine<ConfiguredAdvisor>> {
        let store = FileStore::new(tasks_dir(&self.dir));
        let mut engine = SessionEngine::new(
            self.config.advisory.advisor_or_rules(),
            Box::new(store),
            self.config.settings(),
        );
        let notifications = &self.config.notifications;
        if notifications.enabled && notifications.bell {
            engine = engine.with_notifier(Box::new(BellNotifier));
        }
        if let Some(identity) = LocalProfileAuth::restore(&self.dir) {
            if let Err(e) = engine.restore_session(identity) {
                tracing::warn!(error = %e, "could not restore saved session, continuing signed out");
            }
        }
        engine.drain_events();
        Ok(engine)
    }

    /// Like [`engine`](Self::engine), but fails when nobody is logged in.
    pub fn signed_in_engine(&self) -> CliResult<SessionEngine<ConfiguredAdvisor>> {
        let engine = self.engine()?;
        if !engine.is_signed_in() {
            return Err("not logged in (run `pomodoro-pro auth login <user>`)".into());
        }
        Ok(engine)
    }
}

/// Run a future on a single-threaded runtime.
pub fn block_on<F: Future>(future: F) -> CliResult<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

/// Print user-facing notices to stderr; other events are not shown.
pub fn print_notices(events: &[Event]) {
    for event in events {
        if let Event::Notice {
            level,
            title,
            description,
            ..
        } = event
        {
            let prefix = match level {
                NoticeLevel::Info => "",
                NoticeLevel::Error => "! ",
            };
            match description {
                Some(description) => eprintln!("{prefix}{title} {description}"),
                None => eprintln!("{prefix}{title}"),
            }
        }
    }
}

/// Ask a yes/no question on stdin. End of input counts as "no".
pub fn confirm(question: &str) -> bool {
    eprint!("{question} [y/N] ");
    let _ = std::io::stderr().flush();
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => false,
        Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
    }
}
