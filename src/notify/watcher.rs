//! Turns the remote client's change pushes into a pull-based watch stream.

use crate::client::{RemoteClient, SubscriptionId};
use crate::core::{ChangeSet, KeyValue, Snapshot};
use crate::error::{ConfigError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

#[cfg(feature = "metrics")]
use crate::metrics::WatchMetrics;

/// State owned by the single consumer calling `next`.
struct Consumer {
    /// Latest pushed snapshot. Pushes that arrive before the consumer looks
    /// overwrite each other; only the newest one matters for the diff.
    updates: watch::Receiver<Snapshot>,
    /// Last snapshot handed out, private to this watcher.
    observed: Snapshot,
}

/// A stream of configuration changes from a remote client.
///
/// Created by [`ApolloSource::watch`](crate::sources::ApolloSource::watch).
/// Each call to [`next`](Self::next) waits for the client to push a new
/// snapshot and returns the entries that differ from the previous one. The
/// wait has no timeout: if the remote service is unreachable, `next` simply
/// keeps waiting until the client reconnects or [`stop`](Self::stop) is
/// called.
///
/// Only one `next` call may be pending at a time. A second concurrent call
/// fails with [`ConfigError::ConcurrentNext`]. `stop` may be called from any
/// thread or task at any time and releases a pending `next` immediately.
///
/// A push that changes nothing visible still wakes `next`, which then
/// returns an empty batch. Callers can therefore tell "notified, nothing new"
/// apart from "not notified yet".
///
/// # Examples
///
/// ```rust,no_run
/// use apollo_source::prelude::*;
///
/// # async fn example(source: ApolloSource) -> Result<()> {
/// let watcher = source.watch()?;
/// loop {
///     match watcher.next().await {
///         Ok(changed) => {
///             for kv in changed {
///                 println!("{} changed", kv.key);
///             }
///         }
///         Err(e) if e.is_stopped() => break,
///         Err(e) => return Err(e),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct ApolloWatcher {
    client: Arc<dyn RemoteClient>,
    subscription: Mutex<Option<SubscriptionId>>,
    stop_tx: watch::Sender<bool>,
    consumer: tokio::sync::Mutex<Consumer>,
    #[cfg(feature = "metrics")]
    metrics: Option<WatchMetrics>,
}

impl ApolloWatcher {
    /// Subscribe to `client` and record its current snapshot as the baseline.
    ///
    /// The listener is registered before the baseline is read, so a push that
    /// races with construction is either part of the baseline or shows up on
    /// the first `next`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Subscription`] if the client refuses the listener.
    pub fn new(client: Arc<dyn RemoteClient>) -> Result<Self> {
        let (update_tx, updates) = watch::channel(Snapshot::default());
        let id = client.subscribe(Box::new(move |snapshot: &Snapshot| {
            update_tx.send_replace(snapshot.clone());
        }))?;
        let observed = client.snapshot();
        let (stop_tx, _) = watch::channel(false);

        debug!(
            "Watcher subscribed as {:?} with {} baseline keys",
            id,
            observed.len()
        );

        Ok(Self {
            client,
            subscription: Mutex::new(Some(id)),
            stop_tx,
            consumer: tokio::sync::Mutex::new(Consumer { updates, observed }),
            #[cfg(feature = "metrics")]
            metrics: None,
        })
    }

    #[cfg(feature = "metrics")]
    pub(crate) fn with_metrics(mut self, metrics: WatchMetrics) -> Self {
        metrics.watcher_started();
        self.metrics = Some(metrics);
        self
    }

    /// Wait for the next change and return the new or modified entries.
    ///
    /// Keys removed by the push are not part of the result; use
    /// [`next_changes`](Self::next_changes) to see them.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::WatcherStopped`] once [`stop`](Self::stop) was called
    /// - [`ConfigError::ConcurrentNext`] if another call is already pending
    pub async fn next(&self) -> Result<Vec<KeyValue>> {
        self.next_changes().await.map(|changes| changes.updated)
    }

    /// Wait for the next change and return both updated and removed keys.
    ///
    /// # Errors
    ///
    /// Same as [`next`](Self::next).
    pub async fn next_changes(&self) -> Result<ChangeSet> {
        let mut stopped = self.stop_tx.subscribe();
        if *stopped.borrow() {
            return Err(ConfigError::WatcherStopped);
        }

        let mut consumer = self
            .consumer
            .try_lock()
            .map_err(|_| ConfigError::ConcurrentNext)?;

        tokio::select! {
            biased;
            _ = stopped.wait_for(|stop| *stop) => return Err(ConfigError::WatcherStopped),
            changed = consumer.updates.changed() => {
                if changed.is_err() {
                    return Err(ConfigError::WatcherStopped);
                }
            }
        }

        let latest = consumer.updates.borrow_and_update().clone();
        let changes = consumer.observed.diff(&latest);
        consumer.observed = latest;

        debug!(
            "Watcher delivering {} updated and {} removed keys",
            changes.updated.len(),
            changes.removed.len()
        );

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_delivery(&changes);
        }

        Ok(changes)
    }

    /// Release the subscription and wake any pending `next`.
    ///
    /// Calling `stop` more than once is harmless.
    pub fn stop(&self) {
        self.release();
        self.stop_tx.send_replace(true);
    }

    /// Returns true once [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    fn release(&self) {
        let Some(id) = self.subscription.lock().take() else {
            return;
        };

        if self.client.unsubscribe(id) {
            debug!("Watcher {:?} unsubscribed", id);
        } else {
            warn!("Watcher {:?} was not registered with the client", id);
        }

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.watcher_stopped();
        }
    }
}

impl Drop for ApolloWatcher {
    fn drop(&mut self) {
        self.release();
    }
}
