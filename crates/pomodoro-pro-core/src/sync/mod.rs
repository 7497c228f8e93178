//! Sync bridge between the local task tree and the per-user store.
//!
//! The store holds one value per user: the whole forest. Every local
//! mutation pushes a full replacement and every push from the store replaces
//! the local forest. There is no delta sync and no merge; the last writer
//! wins for the entire forest.

mod file_store;
mod memory;

use std::future;

use tokio::sync::watch;

use crate::auth::UserIdentity;
use crate::error::SyncError;
use crate::task::Task;

pub use file_store::FileStore;
pub use memory::MemoryStore;

/// A value pushed by the store: the forest, or `None` if the key is empty.
pub type Snapshot = Option<Vec<Task>>;

/// Realtime store keyed by user.
pub trait TaskStore {
    /// Start listening to the user's forest. The current value is available
    /// immediately through [`Subscription::current`].
    fn subscribe(&self, user: &UserIdentity) -> Result<Subscription, SyncError>;

    /// Replace the user's whole forest.
    fn replace_all(&self, user: &UserIdentity, forest: &[Task]) -> Result<(), SyncError>;
}

/// Live view of one user's forest. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    key: String,
    rx: watch::Receiver<Snapshot>,
}

impl Subscription {
    pub fn new(key: impl Into<String>, rx: watch::Receiver<Snapshot>) -> Self {
        Self {
            key: key.into(),
            rx,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Latest value, marking it as seen.
    pub fn current(&mut self) -> Snapshot {
        self.rx.borrow_and_update().clone()
    }

    /// A value newer than the last one seen, without waiting.
    pub fn try_next(&mut self) -> Option<Snapshot> {
        match self.rx.has_changed() {
            Ok(true) => Some(self.rx.borrow_and_update().clone()),
            _ => None,
        }
    }

    /// Wait for a value newer than the last one seen.
    pub async fn next(&mut self) -> Result<Snapshot, SyncError> {
        self.rx.changed().await.map_err(|_| SyncError::Closed)?;
        Ok(self.rx.borrow_and_update().clone())
    }
}

/// Connects the engine's tree to a [`TaskStore`] for the signed-in user.
pub struct SyncBridge {
    store: Box<dyn TaskStore>,
    user: Option<UserIdentity>,
    subscription: Option<Subscription>,
}

impl SyncBridge {
    pub fn new(store: Box<dyn TaskStore>) -> Self {
        Self {
            store,
            user: None,
            subscription: None,
        }
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Subscribe to `user`'s forest and return its current value (empty if
    /// absent). Any previous subscription is cancelled first.
    pub fn attach(&mut self, user: UserIdentity) -> Result<Vec<Task>, SyncError> {
        self.detach();
        let mut subscription = self.store.subscribe(&user)?;
        let initial = subscription.current().unwrap_or_default();
        tracing::debug!(key = subscription.key(), tasks = initial.len(), "attached to store");
        self.subscription = Some(subscription);
        self.user = Some(user);
        Ok(initial)
    }

    /// Stop listening. No later push is delivered.
    pub fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            tracing::debug!(key = subscription.key(), "detached from store");
        }
        self.user = None;
    }

    /// Replace the remote forest. Failures are logged, never returned: the
    /// local tree stays authoritative until the store pushes again.
    pub fn push(&mut self, forest: &[Task]) {
        let Some(user) = &self.user else {
            return;
        };
        match self.store.replace_all(user, forest) {
            Ok(()) => {
                // Our own write comes back through the subscription; it is
                // already applied locally.
                if let Some(subscription) = self.subscription.as_mut() {
                    subscription.current();
                }
            }
            Err(e) => tracing::warn!(error = %e, uid = %user.uid, "failed to push tasks to store"),
        }
    }

    /// A pending store push, if one arrived since the last look.
    pub fn poll(&mut self) -> Option<Vec<Task>> {
        self.subscription
            .as_mut()?
            .try_next()
            .map(Option::unwrap_or_default)
    }

    /// Wait for the next store push. Never completes while detached.
    pub async fn next_snapshot(&mut self) -> Vec<Task> {
        let result = match self.subscription.as_mut() {
            Some(subscription) => subscription.next().await,
            None => return future::pending().await,
        };
        match result {
            Ok(snapshot) => snapshot.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "store subscription ended");
                self.subscription = None;
                future::pending().await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest(names: &[&str]) -> Vec<Task> {
        names.iter().map(|name| Task::new(*name, 60)).collect()
    }

    #[test]
    fn attach_returns_current_value() {
        let store = MemoryStore::new();
        let alice = UserIdentity::new("alice");
        store.set_remote(&alice, Some(forest(&["a", "b"])));

        let mut bridge = SyncBridge::new(Box::new(store.clone()));
        let initial = bridge.attach(alice).unwrap();
        assert_eq!(initial.len(), 2);
        assert!(bridge.poll().is_none());
    }

    #[test]
    fn absent_value_is_empty_forest() {
        let store = MemoryStore::new();
        let mut bridge = SyncBridge::new(Box::new(store.clone()));
        assert!(bridge.attach(UserIdentity::new("new")).unwrap().is_empty());

        store.set_remote(&UserIdentity::new("new"), Some(forest(&["x"])));
        assert_eq!(bridge.poll().unwrap().len(), 1);
        store.set_remote(&UserIdentity::new("new"), None);
        assert_eq!(bridge.poll(), Some(Vec::new()));
    }

    #[test]
    fn own_push_is_not_echoed() {
        let store = MemoryStore::new();
        let mut bridge = SyncBridge::new(Box::new(store.clone()));
        let bob = UserIdentity::new("bob");
        bridge.attach(bob.clone()).unwrap();

        let tasks = forest(&["one"]);
        bridge.push(&tasks);
        assert_eq!(store.value(&bob), Some(tasks));
        assert!(bridge.poll().is_none());
    }

    #[test]
    fn detach_stops_delivery_and_pushes() {
        let store = MemoryStore::new();
        let carol = UserIdentity::new("carol");
        let mut bridge = SyncBridge::new(Box::new(store.clone()));
        bridge.attach(carol.clone()).unwrap();
        bridge.detach();

        store.set_remote(&carol, Some(forest(&["late"])));
        assert!(bridge.poll().is_none());

        bridge.push(&forest(&["ignored"]));
        assert_eq!(store.value(&carol).unwrap()[0].text, "late");
    }

    #[test]
    fn reattach_switches_users() {
        let store = MemoryStore::new();
        let (a, b) = (UserIdentity::new("a"), UserIdentity::new("b"));
        store.set_remote(&b, Some(forest(&["b-task"])));

        let mut bridge = SyncBridge::new(Box::new(store.clone()));
        bridge.attach(a.clone()).unwrap();
        let initial = bridge.attach(b.clone()).unwrap();
        assert_eq!(initial[0].text, "b-task");

        store.set_remote(&a, Some(forest(&["stale"])));
        assert!(bridge.poll().is_none());
        assert_eq!(bridge.user(), Some(&b));
    }

    #[tokio::test]
    async fn next_snapshot_waits_for_push() {
        let store = MemoryStore::new();
        let dave = UserIdentity::new("dave");
        let mut bridge = SyncBridge::new(Box::new(store.clone()));
        bridge.attach(dave.clone()).unwrap();

        store.set_remote(&dave, Some(forest(&["pushed"])));
        let snapshot = bridge.next_snapshot().await;
        assert_eq!(snapshot[0].text, "pushed");
    }
}
