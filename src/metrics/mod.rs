//! Built-in metrics for loads and watch deliveries.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Snapshot loads
//! - Change deliveries and changed-key counts
//! - Active watchers
//! - Time since the last delivered change
//!
//! # Examples
//!
//! ```rust,no_run
//! use apollo_source::client::memory::MemoryClient;
//! use apollo_source::metrics::WatchMetrics;
//! use apollo_source::prelude::*;
//! use opentelemetry::global;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<()> {
//! let client = Arc::new(MemoryClient::new());
//! let source = ApolloSource::new(SourceOptions::new(), &client.connector())?
//!     .with_metrics(WatchMetrics::new(global::meter("my-app")));
//! # Ok(())
//! # }
//! ```

mod watch_metrics;

pub use watch_metrics::WatchMetrics;
