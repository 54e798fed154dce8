//! Error types for apollo-source.

/// Result type alias for apollo-source operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or watching remote configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The remote configuration client could not be started.
    #[error("Failed to start remote configuration client: {0}")]
    Bootstrap(String),

    /// Registering a change listener with the remote client failed.
    #[error("Failed to subscribe to configuration changes: {0}")]
    Subscription(String),

    /// The watcher was stopped; no further changes will be delivered.
    #[error("Watcher stopped")]
    WatcherStopped,

    /// Another `next` call is already waiting on this watcher.
    #[error("Another call to next is already pending on this watcher")]
    ConcurrentNext,

    /// Failed to load source options.
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    /// Failed to deserialize source options.
    #[error("Failed to deserialize configuration: {0}")]
    DeserializationError(String),
}

impl ConfigError {
    /// Returns true if this error is the terminal signal of a stopped watcher.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::WatcherStopped)
    }
}
