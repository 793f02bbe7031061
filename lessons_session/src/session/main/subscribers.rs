use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::session::types::Session;

type Listener = Arc<dyn Fn(&Session) + Send + Sync>;

/// Registry of state-transition listeners.
///
/// Notification runs on a snapshot of the registry with no lock held, so
/// listeners may subscribe, unsubscribe or call back into the manager.
#[derive(Default)]
pub(super) struct Listeners {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Listener)>>,
}

impl Listeners {
    fn entries(&self) -> MutexGuard<'_, Vec<(u64, Listener)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn subscribe<F>(self: &Arc<Self>, listener: F) -> Subscription
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries().push((id, Arc::new(listener)));
        Subscription {
            id,
            listeners: Arc::downgrade(self),
        }
    }

    fn remove(&self, id: u64) {
        self.entries().retain(|(entry_id, _)| *entry_id != id);
    }

    fn is_registered(&self, id: u64) -> bool {
        self.entries().iter().any(|(entry_id, _)| *entry_id == id)
    }

    pub(super) fn notify(&self, session: &Session) {
        let snapshot: Vec<(u64, Listener)> = self.entries().clone();
        for (id, listener) in snapshot {
            // Skip listeners removed by an earlier listener of this round
            if self.is_registered(id) {
                listener(session);
            }
        }
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.entries().len()
    }
}

/// Handle returned by [`SessionManager::subscribe`](crate::SessionManager::subscribe).
///
/// The listener stays registered until this handle is dropped or
/// [`unsubscribe`](Subscription::unsubscribe) is called.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.remove(self.id);
        }
    }
}
