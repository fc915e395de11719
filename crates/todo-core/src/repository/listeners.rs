//! Auth Listener Registry
//!
//! Keeps the callbacks registered through `on_auth_state_change`. A
//! [`Subscription`] removes its callback when dropped.

use std::sync::{Arc, Mutex, Weak};

use super::lock;
use crate::domain::{AuthEvent, Session};

/// Callback invoked with each auth event and the session after the event
pub type AuthCallback = Arc<dyn Fn(AuthEvent, Option<&Session>) + Send + Sync>;

/// Box a closure as an [`AuthCallback`]
pub fn auth_callback(
    callback: impl Fn(AuthEvent, Option<&Session>) + Send + Sync + 'static,
) -> AuthCallback {
    Arc::new(callback)
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    entries: Vec<(u64, AuthCallback)>,
}

/// Shared registry of auth listeners
#[derive(Clone, Default)]
pub struct AuthListeners {
    table: Arc<Mutex<ListenerTable>>,
}

impl AuthListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: AuthCallback) -> Subscription {
        let mut table = lock(&self.table);
        let id = table.next_id;
        table.next_id += 1;
        table.entries.push((id, callback));
        Subscription {
            id,
            table: Arc::downgrade(&self.table),
        }
    }

    /// Notify every listener registered at the time of the call
    pub fn emit(&self, event: AuthEvent, session: Option<&Session>) {
        // Callbacks may unsubscribe themselves; never call them under the lock
        let callbacks: Vec<AuthCallback> = lock(&self.table)
            .entries
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        tracing::debug!(event = event.as_str(), listeners = callbacks.len(), "auth event");
        for callback in callbacks {
            callback(event, session);
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.table).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle to a registered listener; dropping it unregisters the listener
#[must_use = "dropping a Subscription immediately unregisters the listener"]
pub struct Subscription {
    id: u64,
    table: Weak<Mutex<ListenerTable>>,
}

impl Subscription {
    /// Unregister now
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            lock(&table).entries.retain(|(id, _)| *id != self.id);
        }
    }
}
