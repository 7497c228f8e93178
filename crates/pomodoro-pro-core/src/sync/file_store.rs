//! JSON-file store: one `<uid>.json` per user.
//!
//! Subscribers in the same process are notified on every write. Writes from
//! other processes are picked up on the next subscription.

use std::fs;
use std::path::{Path, PathBuf};

use super::memory::Channels;
use super::{Snapshot, Subscription, TaskStore};
use crate::auth::UserIdentity;
use crate::error::SyncError;
use crate::task::Task;

#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    channels: Channels,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            channels: Channels::default(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, user: &UserIdentity) -> PathBuf {
        self.dir.join(format!("{}.json", user.uid))
    }

    /// Read the stored forest; a missing file is an absent value.
    pub fn load(&self, user: &UserIdentity) -> Result<Snapshot, SyncError> {
        let path = self.path_for(user);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SyncError::Io { path, source }),
        }
    }

    fn write(&self, user: &UserIdentity, forest: &[Task]) -> Result<(), SyncError> {
        let path = self.path_for(user);
        let json = serde_json::to_string_pretty(forest)?;
        let tmp = path.with_extension("json.tmp");
        fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(&tmp, json))
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|source| SyncError::Io { path, source })
    }
}

impl TaskStore for FileStore {
    fn subscribe(&self, user: &UserIdentity) -> Result<Subscription, SyncError> {
        let initial = self.load(user)?;
        Ok(self.channels.subscribe(&user.tasks_key(), || initial))
    }

    fn replace_all(&self, user: &UserIdentity, forest: &[Task]) -> Result<(), SyncError> {
        self.write(user, forest)?;
        self.channels.publish(&user.tasks_key(), Some(forest.to_vec()));
        Ok(())
    }
}
