//! Apollo-backed configuration source.

use super::{ConfigSource, ConfigWatcher};
use crate::client::{Connector, RemoteClient};
use crate::core::{KeyValue, SourceOptions, backup};
use crate::error::{ConfigError, Result};
use crate::notify::ApolloWatcher;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

#[cfg(feature = "metrics")]
use crate::metrics::WatchMetrics;

/// Configuration source backed by a remote Apollo client.
///
/// Owns the client connection. [`load`](Self::load) reads the client's
/// already-synchronized cache and never touches the network;
/// [`watch`](Self::watch) opens an independent change stream.
///
/// # Examples
///
/// ```rust
/// use apollo_source::client::memory::MemoryClient;
/// use apollo_source::prelude::*;
/// use std::sync::Arc;
///
/// # fn example() -> Result<()> {
/// let client = Arc::new(MemoryClient::with_entries([("timeout", "30")]));
/// let backup = std::env::temp_dir().join("apollo-source-doc");
///
/// let source = ApolloSource::new(
///     SourceOptions::new()
///         .with_app_id("order-service")
///         .with_backup_path(&backup),
///     &client.connector(),
/// )?;
///
/// let entries = source.load()?;
/// assert_eq!(entries.len(), 1);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct ApolloSource {
    client: Arc<dyn RemoteClient>,
    options: SourceOptions,
    backup_dir: PathBuf,
    #[cfg(feature = "metrics")]
    metrics: Option<WatchMetrics>,
}

impl ApolloSource {
    /// Prepare the backup directory and start the remote client.
    ///
    /// The backup path is resolved against the working directory and created
    /// if missing. Failing to create it is logged, not returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Bootstrap`] if the client cannot be started.
    /// No source is created in that case; the caller decides whether to
    /// retry or give up.
    pub fn new<C>(options: SourceOptions, connector: &C) -> Result<Self>
    where
        C: Connector + ?Sized,
    {
        let backup_dir = backup::resolve_from_cwd(&options.backup_path);
        backup::ensure_backup_dir(&backup_dir);

        let client_config = options.client_config(&backup_dir);
        let client = connector.start(&client_config).map_err(|e| {
            error!("Failed to start Apollo client for '{}': {}", options.app_id, e);
            match e {
                ConfigError::Bootstrap(_) => e,
                other => ConfigError::Bootstrap(other.to_string()),
            }
        })?;

        info!(
            "Started Apollo source for app '{}' (cluster '{}', namespace '{}'), backup dir {}",
            options.app_id,
            options.cluster,
            options.namespace,
            backup_dir.display()
        );

        Ok(Self {
            client,
            options,
            backup_dir,
            #[cfg(feature = "metrics")]
            metrics: None,
        })
    }

    /// Attach metrics recorded by this source and the watchers it creates.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, metrics: WatchMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Snapshot of all cached configuration.
    ///
    /// Order is unspecified and may differ between calls.
    pub fn load(&self) -> Result<Vec<KeyValue>> {
        let entries = self.client.snapshot().to_key_values();

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_load(entries.len());
        }

        Ok(entries)
    }

    /// Open a new change stream.
    ///
    /// Each call creates its own subscription; stopping one watcher does not
    /// affect the others.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Subscription`] if the client refuses the
    /// listener. [`load`](Self::load) keeps working either way.
    pub fn watch(&self) -> Result<ApolloWatcher> {
        let watcher = ApolloWatcher::new(Arc::clone(&self.client))?;

        #[cfg(feature = "metrics")]
        let watcher = match &self.metrics {
            Some(metrics) => watcher.with_metrics(metrics.clone()),
            None => watcher,
        };

        Ok(watcher)
    }

    /// The resolved backup directory.
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// The options this source was created with.
    pub fn options(&self) -> &SourceOptions {
        &self.options
    }
}

impl ConfigSource for ApolloSource {
    fn load(&self) -> Result<Vec<KeyValue>> {
        ApolloSource::load(self)
    }

    fn watch(&self) -> Result<Box<dyn ConfigWatcher>> {
        Ok(Box::new(ApolloSource::watch(self)?))
    }

    fn name(&self) -> String {
        format!("apollo:{}", self.options.app_id)
    }
}

#[async_trait]
impl ConfigWatcher for ApolloWatcher {
    async fn next(&self) -> Result<Vec<KeyValue>> {
        ApolloWatcher::next(self).await
    }

    fn stop(&self) {
        ApolloWatcher::stop(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use crate::client::memory::MemoryClient;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn options_in(dir: &Path) -> SourceOptions {
        SourceOptions::new()
            .with_app_id("svc")
            .with_backup_path(dir.join("cache"))
    }

    #[test]
    fn test_new_creates_backup_dir() {
        let temp_dir = TempDir::new().unwrap();
        let client = Arc::new(MemoryClient::new());

        let source = ApolloSource::new(options_in(temp_dir.path()), &client.connector()).unwrap();

        assert!(source.backup_dir().is_dir());
        let started = client.started_with().unwrap();
        assert_eq!(started.backup_config_path, temp_dir.path().join("cache"));
        assert_eq!(started.app_id, "svc");
    }

    #[test]
    fn test_bootstrap_failure() {
        let temp_dir = TempDir::new().unwrap();
        let connector = |_: &ClientConfig| -> Result<Arc<dyn RemoteClient>> {
            Err(ConfigError::LoadError("connection refused".to_string()))
        };

        let result = ApolloSource::new(options_in(temp_dir.path()), &connector);
        match result {
            Err(ConfigError::Bootstrap(msg)) => assert!(msg.contains("connection refused")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected bootstrap failure"),
        }
    }

    #[test]
    fn test_load_returns_all_entries() {
        let temp_dir = TempDir::new().unwrap();
        let client = Arc::new(MemoryClient::with_entries([("a", "1"), ("b", "2")]));
        let source = ApolloSource::new(options_in(temp_dir.path()), &client.connector()).unwrap();

        let first: HashSet<_> = source.load().unwrap().into_iter().collect();
        let second: HashSet<_> = source.load().unwrap().into_iter().collect();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert!(first.contains(&KeyValue::new("a", "1")));
    }

    #[test]
    fn test_watch_failure_keeps_load_working() {
        let temp_dir = TempDir::new().unwrap();
        let client = Arc::new(MemoryClient::with_entries([("a", "1")]));
        let source = ApolloSource::new(options_in(temp_dir.path()), &client.connector()).unwrap();

        client.reject_subscriptions(true);
        assert!(matches!(source.watch(), Err(ConfigError::Subscription(_))));
        assert_eq!(source.load().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_trait_object_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let client = Arc::new(MemoryClient::new());
        let source: Box<dyn ConfigSource> = Box::new(
            ApolloSource::new(options_in(temp_dir.path()), &client.connector()).unwrap(),
        );
        assert_eq!(source.name(), "apollo:svc");

        let watcher = source.watch().unwrap();
        client.set("feature.enabled", "true");
        assert_eq!(
            watcher.next().await.unwrap(),
            vec![KeyValue::new("feature.enabled", "true")]
        );

        watcher.stop();
        assert!(watcher.next().await.unwrap_err().is_stopped());
    }
}
