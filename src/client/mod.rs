//! The seam between this crate and a remote configuration client.
//!
//! A remote client owns the transport, authentication and backup-cache
//! format. This crate only needs three things from it: a way to start it,
//! a readable snapshot of its cache, and a way to be told when that cache
//! changes.

pub mod memory;

use crate::core::Snapshot;
use crate::error::Result;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Startup parameters handed to the remote client.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Application identity.
    pub app_id: String,
    /// Deployment cluster.
    pub cluster: String,
    /// Namespace to fetch.
    pub namespace_name: String,
    /// Config service address.
    pub ip: String,
    /// Whether to persist a local backup.
    pub is_backup_config: bool,
    /// Access key secret.
    pub secret: String,
    /// Absolute path of the backup directory.
    pub backup_config_path: PathBuf,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("app_id", &self.app_id)
            .field("cluster", &self.cluster)
            .field("namespace_name", &self.namespace_name)
            .field("ip", &self.ip)
            .field("is_backup_config", &self.is_backup_config)
            .field("backup_config_path", &self.backup_config_path)
            .finish_non_exhaustive()
    }
}

/// Token identifying a registered change listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Callback invoked by the client with its new snapshot after every change push.
///
/// Listeners run on the client's own thread or task and must not block.
pub type Listener = Box<dyn Fn(&Snapshot) + Send + Sync>;

/// A live connection to the remote configuration service.
pub trait RemoteClient: Send + Sync {
    /// The latest snapshot the client has synchronized.
    ///
    /// Must not block on the network.
    fn snapshot(&self) -> Snapshot;

    /// Register a listener for change pushes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Subscription`](crate::error::ConfigError::Subscription)
    /// if the listener cannot be registered.
    fn subscribe(&self, listener: Listener) -> Result<SubscriptionId>;

    /// Remove a previously registered listener.
    ///
    /// Returns false if the id was unknown.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// Starts a remote client.
pub trait Connector {
    /// Start the client and wait for its initial synchronization.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Bootstrap`](crate::error::ConfigError::Bootstrap)
    /// if the client cannot be started.
    fn start(&self, config: &ClientConfig) -> Result<Arc<dyn RemoteClient>>;
}

impl<F> Connector for F
where
    F: Fn(&ClientConfig) -> Result<Arc<dyn RemoteClient>>,
{
    fn start(&self, config: &ClientConfig) -> Result<Arc<dyn RemoteClient>> {
        self(config)
    }
}
