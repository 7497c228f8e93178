//! In-process store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use super::{Snapshot, Subscription, TaskStore};
use crate::auth::UserIdentity;
use crate::error::SyncError;
use crate::task::Task;

/// Per-key watch channels shared by the store implementations.
#[derive(Debug, Default)]
pub(crate) struct Channels {
    senders: Mutex<HashMap<String, watch::Sender<Snapshot>>>,
}

impl Channels {
    /// Subscribe to `key`, seeding a new channel with `init` on first use.
    pub(crate) fn subscribe(&self, key: &str, init: impl FnOnce() -> Snapshot) -> Subscription {
        let mut senders = self.senders.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = senders
            .entry(key.to_string())
            .or_insert_with(|| watch::channel(init()).0);
        Subscription::new(key, sender.subscribe())
    }

    pub(crate) fn publish(&self, key: &str, snapshot: Snapshot) {
        let mut senders = self.senders.lock().unwrap_or_else(PoisonError::into_inner);
        match senders.get(key) {
            Some(sender) => {
                sender.send_replace(snapshot);
            }
            None => {
                senders.insert(key.to_string(), watch::channel(snapshot).0);
            }
        }
    }

    pub(crate) fn value(&self, key: &str) -> Option<Snapshot> {
        let senders = self.senders.lock().unwrap_or_else(PoisonError::into_inner);
        senders.get(key).map(|sender| sender.borrow().clone())
    }
}

/// Store that keeps every user's forest in memory. Clones share state, so
/// a clone can play the part of another device writing to the same key.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    channels: Arc<Channels>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value for `user` (`None` if never written or cleared).
    pub fn value(&self, user: &UserIdentity) -> Snapshot {
        self.channels.value(&user.tasks_key()).flatten()
    }

    /// Write as another client would, including clearing the key.
    pub fn set_remote(&self, user: &UserIdentity, snapshot: Snapshot) {
        self.channels.publish(&user.tasks_key(), snapshot);
    }
}

impl TaskStore for MemoryStore {
    fn subscribe(&self, user: &UserIdentity) -> Result<Subscription, SyncError> {
        Ok(self.channels.subscribe(&user.tasks_key(), || None))
    }

    fn replace_all(&self, user: &UserIdentity, forest: &[Task]) -> Result<(), SyncError> {
        self.channels.publish(&user.tasks_key(), Some(forest.to_vec()));
        Ok(())
    }
}
