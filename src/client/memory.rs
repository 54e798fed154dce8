//! In-process remote client.
//!
//! `MemoryClient` keeps its cache in memory and pushes changes synchronously
//! from whichever thread calls [`MemoryClient::publish`]. It is what the test
//! suite runs against, and it is handy for embedding a fixed configuration
//! or replaying changes offline.

use super::{ClientConfig, Connector, Listener, RemoteClient, SubscriptionId};
use crate::core::Snapshot;
use crate::error::{ConfigError, Result};
use crate::notify::ListenerRegistry;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A remote client whose "server" is the caller.
///
/// # Examples
///
/// ```rust
/// use apollo_source::client::RemoteClient;
/// use apollo_source::client::memory::MemoryClient;
///
/// let client = MemoryClient::with_entries([("timeout", "30")]);
/// client.set("retries", "3");
///
/// let snapshot = client.snapshot();
/// assert_eq!(snapshot.get("retries"), Some(b"3".as_slice()));
/// ```
pub struct MemoryClient {
    cache: ArcSwap<HashMap<String, Vec<u8>>>,
    listeners: ListenerRegistry,
    reject_subscriptions: AtomicBool,
    started_with: Mutex<Option<ClientConfig>>,
    // Serializes writers so pushes reach listeners in publish order.
    publish_lock: Mutex<()>,
}

impl MemoryClient {
    /// Create a client with an empty cache.
    pub fn new() -> Self {
        Self::from_snapshot(Snapshot::default())
    }

    /// Create a client pre-populated with entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        Self::from_snapshot(entries.into_iter().collect())
    }

    fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            cache: ArcSwap::from_pointee(snapshot.to_map()),
            listeners: ListenerRegistry::new(),
            reject_subscriptions: AtomicBool::new(false),
            started_with: Mutex::new(None),
            publish_lock: Mutex::new(()),
        }
    }

    /// Replace the whole cache and push the new snapshot to listeners.
    pub fn publish<I, K, V>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let map: HashMap<String, Vec<u8>> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.replace(map);
    }

    /// Set a single key and push the new snapshot.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        let _guard = self.publish_lock.lock();
        let mut map = HashMap::clone(&self.cache.load());
        map.insert(key.into(), value.into());
        self.store_and_notify(map);
    }

    /// Remove a single key and push the new snapshot.
    pub fn remove(&self, key: &str) {
        let _guard = self.publish_lock.lock();
        let mut map = HashMap::clone(&self.cache.load());
        map.remove(key);
        self.store_and_notify(map);
    }

    fn replace(&self, map: HashMap<String, Vec<u8>>) {
        let _guard = self.publish_lock.lock();
        self.store_and_notify(map);
    }

    fn store_and_notify(&self, map: HashMap<String, Vec<u8>>) {
        let shared = Arc::new(map);
        self.cache.store(Arc::clone(&shared));
        self.listeners.notify_all(&Snapshot::from_shared(shared));
    }

    /// Make subsequent `subscribe` calls fail (or succeed again).
    pub fn reject_subscriptions(&self, reject: bool) {
        self.reject_subscriptions.store(reject, Ordering::SeqCst);
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// The config this client was last started with through its connector.
    pub fn started_with(&self) -> Option<ClientConfig> {
        self.started_with.lock().clone()
    }

    /// A connector that hands out this client.
    pub fn connector(self: &Arc<Self>) -> MemoryConnector {
        MemoryConnector {
            client: Arc::clone(self),
        }
    }
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteClient for MemoryClient {
    fn snapshot(&self) -> Snapshot {
        Snapshot::from_shared(self.cache.load_full())
    }

    fn subscribe(&self, listener: Listener) -> Result<SubscriptionId> {
        if self.reject_subscriptions.load(Ordering::SeqCst) {
            return Err(ConfigError::Subscription(
                "memory client is rejecting subscriptions".to_string(),
            ));
        }
        Ok(self.listeners.subscribe(listener))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }
}

/// Connector returned by [`MemoryClient::connector`].
pub struct MemoryConnector {
    client: Arc<MemoryClient>,
}

impl Connector for MemoryConnector {
    fn start(&self, config: &ClientConfig) -> Result<Arc<dyn RemoteClient>> {
        *self.client.started_with.lock() = Some(config.clone());
        Ok(Arc::clone(&self.client) as Arc<dyn RemoteClient>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_snapshot_reflects_updates() {
        let client = MemoryClient::with_entries([("a", "1")]);
        let before = client.snapshot();

        client.set("b", "2");
        client.remove("a");

        let after = client.snapshot();
        assert_eq!(before.get("a"), Some(b"1".as_slice()));
        assert_eq!(after.get("a"), None);
        assert_eq!(after.get("b"), Some(b"2".as_slice()));
    }

    #[test]
    fn test_publish_notifies_listeners() {
        let client = MemoryClient::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = Arc::clone(&seen);
        let id = client
            .subscribe(Box::new(move |snapshot: &Snapshot| {
                seen_clone.store(snapshot.len(), Ordering::SeqCst);
            }))
            .unwrap();

        client.publish([("x", "1"), ("y", "2"), ("z", "3")]);
        assert_eq!(seen.load(Ordering::SeqCst), 3);

        assert!(client.unsubscribe(id));
        assert_eq!(client.listener_count(), 0);
    }

    #[test]
    fn test_reject_subscriptions() {
        let client = MemoryClient::new();
        client.reject_subscriptions(true);
        let result = client.subscribe(Box::new(|_: &Snapshot| {}));
        assert!(matches!(result, Err(ConfigError::Subscription(_))));

        client.reject_subscriptions(false);
        assert!(client.subscribe(Box::new(|_: &Snapshot| {})).is_ok());
    }

    #[test]
    fn test_connector_records_config() {
        let client = Arc::new(MemoryClient::new());
        let config = ClientConfig {
            app_id: "svc".to_string(),
            cluster: String::new(),
            namespace_name: String::new(),
            ip: String::new(),
            is_backup_config: false,
            secret: String::new(),
            backup_config_path: PathBuf::from("/tmp/cache"),
        };

        let started = client.connector().start(&config).unwrap();
        assert!(started.snapshot().is_empty());
        assert_eq!(client.started_with(), Some(config));
    }
}
