//! Watch metrics tracking using OpenTelemetry.

use crate::core::ChangeSet;
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

/// Metrics collector for loads and watcher deliveries.
///
/// # Examples
///
/// ```rust,no_run
/// use apollo_source::metrics::WatchMetrics;
/// use opentelemetry::global;
///
/// let metrics = WatchMetrics::new(global::meter("apollo-source"));
/// metrics.record_load(42);
/// metrics.update_delivery_age();
/// ```
#[derive(Clone)]
pub struct WatchMetrics {
    loads: Counter<u64>,
    loaded_entries: Histogram<u64>,
    deliveries: Counter<u64>,
    empty_deliveries: Counter<u64>,
    changed_keys: Histogram<u64>,
    active_watchers: Gauge<i64>,
    delivery_age_seconds: Gauge<i64>,
    watcher_count: Arc<AtomicI64>,
    last_delivery: Arc<parking_lot::Mutex<Instant>>,
}

impl WatchMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let loads = meter
            .u64_counter("apollo_source.load.count")
            .with_description("Number of snapshot loads")
            .build();

        let loaded_entries = meter
            .u64_histogram("apollo_source.load.entries")
            .with_description("Number of entries returned per load")
            .build();

        let deliveries = meter
            .u64_counter("apollo_source.watch.deliveries")
            .with_description("Number of change batches delivered to watchers")
            .build();

        let empty_deliveries = meter
            .u64_counter("apollo_source.watch.empty_deliveries")
            .with_description("Number of notifications that carried no visible change")
            .build();

        let changed_keys = meter
            .u64_histogram("apollo_source.watch.changed_keys")
            .with_description("Number of changed keys per delivered batch")
            .build();

        let active_watchers = meter
            .i64_gauge("apollo_source.watch.active")
            .with_description("Number of watchers holding a subscription")
            .build();

        let delivery_age_seconds = meter
            .i64_gauge("apollo_source.watch.age")
            .with_description("Time since the last delivered change in seconds")
            .with_unit("s")
            .build();

        Self {
            loads,
            loaded_entries,
            deliveries,
            empty_deliveries,
            changed_keys,
            active_watchers,
            delivery_age_seconds,
            watcher_count: Arc::new(AtomicI64::new(0)),
            last_delivery: Arc::new(parking_lot::Mutex::new(Instant::now())),
        }
    }

    /// Record a snapshot load returning `entries` entries.
    pub fn record_load(&self, entries: usize) {
        self.loads.add(1, &[]);
        self.loaded_entries.record(entries as u64, &[]);
    }

    /// Record a batch handed out by a watcher.
    pub fn record_delivery(&self, changes: &ChangeSet) {
        self.deliveries.add(1, &[]);
        if changes.is_empty() {
            self.empty_deliveries.add(1, &[]);
        }
        self.changed_keys.record(changes.len() as u64, &[]);
        *self.last_delivery.lock() = Instant::now();
    }

    /// Record a watcher acquiring its subscription.
    pub fn watcher_started(&self) {
        let count = self.watcher_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.active_watchers.record(count, &[]);
    }

    /// Record a watcher releasing its subscription.
    pub fn watcher_stopped(&self) {
        let count = self.watcher_count.fetch_sub(1, Ordering::SeqCst) - 1;
        self.active_watchers.record(count, &[]);
    }

    /// Number of watchers currently holding a subscription.
    pub fn active_watchers(&self) -> i64 {
        self.watcher_count.load(Ordering::SeqCst)
    }

    /// Update the time-since-last-delivery gauge.
    ///
    /// Call periodically to track how stale the watched configuration is.
    pub fn update_delivery_age(&self) {
        let age_secs = self.last_delivery.lock().elapsed().as_secs() as i64;
        self.delivery_age_seconds.record(age_secs, &[]);
    }
}
