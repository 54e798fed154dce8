//! Listener bookkeeping for remote clients.

use crate::client::{Listener, SubscriptionId};
use crate::core::Snapshot;
use parking_lot::RwLock;

/// Internal registry state.
struct ListenerRegistryInner {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

/// Registry of change listeners keyed by [`SubscriptionId`].
///
/// Remote client implementations use this to fan a new snapshot out to every
/// registered listener. Listeners are called in subscription order.
///
/// # Examples
///
/// ```rust
/// use apollo_source::core::Snapshot;
/// use apollo_source::notify::ListenerRegistry;
///
/// let registry = ListenerRegistry::new();
/// let id = registry.subscribe(Box::new(|snapshot: &Snapshot| {
///     println!("{} keys", snapshot.len());
/// }));
///
/// registry.notify_all(&Snapshot::default());
/// assert!(registry.unsubscribe(id));
/// assert!(!registry.unsubscribe(id));
/// ```
pub struct ListenerRegistry {
    inner: RwLock<ListenerRegistryInner>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(ListenerRegistryInner {
                listeners: Vec::new(),
                next_id: 0,
            }),
        }
    }

    /// Register a listener and return its id.
    pub fn subscribe(&self, listener: Listener) -> SubscriptionId {
        let mut inner = self.inner.write();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.listeners.push((id, listener));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.write();
        let before = inner.listeners.len();
        inner.listeners.retain(|(sub_id, _)| *sub_id != id);
        inner.listeners.len() != before
    }

    /// Hand a snapshot to every listener.
    pub fn notify_all(&self, snapshot: &Snapshot) {
        let inner = self.inner.read();
        for (_id, listener) in &inner.listeners {
            listener(snapshot);
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.inner.read().listeners.len()
    }

    /// Returns true if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
