//! The load/watch contract consumed by an application's config subsystem.

use crate::core::KeyValue;
use crate::error::Result;
use async_trait::async_trait;

/// A source of flattened key-value configuration.
///
/// The consumer calls [`load`](ConfigSource::load) once at startup and then
/// [`watch`](ConfigSource::watch) once per change stream it wants.
pub trait ConfigSource: Send + Sync {
    /// Current configuration as key-value pairs.
    ///
    /// Order is unspecified; only the key set is meaningful.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read.
    fn load(&self) -> Result<Vec<KeyValue>>;

    /// Start a new, independent change stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be set up.
    fn watch(&self) -> Result<Box<dyn ConfigWatcher>>;

    /// Get a human-readable name for this source (for logging/debugging).
    fn name(&self) -> String;
}

/// A stream of configuration changes.
#[async_trait]
pub trait ConfigWatcher: Send + Sync {
    /// Wait for the next batch of changed entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::WatcherStopped`](crate::error::ConfigError::WatcherStopped)
    /// once the watcher was stopped.
    async fn next(&self) -> Result<Vec<KeyValue>>;

    /// Stop the stream. Idempotent; wakes a pending `next`.
    fn stop(&self);
}
