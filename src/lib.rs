//! # apollo-source
//!
//! Bridges an Apollo-style push-based configuration client to a pull-based
//! "load a snapshot, then watch for changes" contract.
//!
//! ## Overview
//!
//! `apollo-source` provides:
//! - [`ApolloSource`](sources::ApolloSource): starts the remote client,
//!   prepares its local backup directory and serves point-in-time snapshots
//! - [`ApolloWatcher`](notify::ApolloWatcher): converts the client's change
//!   callbacks into a `next().await` stream of changed entries that can be
//!   stopped from anywhere
//! - [`RemoteClient`](client::RemoteClient) / [`Connector`](client::Connector):
//!   the seam a real client plugs into, plus an in-memory client
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use apollo_source::client::memory::MemoryClient;
//! use apollo_source::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<()> {
//! let client = Arc::new(MemoryClient::with_entries([("server.port", "8080")]));
//!
//! let source = ApolloSource::new(
//!     SourceOptions::new()
//!         .with_app_id("order-service")
//!         .with_cluster("default")
//!         .with_namespace("application")
//!         .with_enable_backup(),
//!     &client.connector(),
//! )?;
//!
//! for kv in source.load()? {
//!     println!("{} = {}", kv.key, String::from_utf8_lossy(&kv.value));
//! }
//!
//! let watcher = source.watch()?;
//! while let Ok(changed) = watcher.next().await {
//!     println!("{} keys changed", changed.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `metrics`: OpenTelemetry instruments for loads and deliveries

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod client;
pub mod core;
pub mod error;
pub mod notify;
pub mod sources;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::client::{Connector, RemoteClient};
    pub use crate::core::{ChangeSet, KeyValue, Snapshot, SourceOptions};
    pub use crate::error::{ConfigError, Result};
    pub use crate::notify::ApolloWatcher;
    pub use crate::sources::{ApolloSource, ConfigSource, ConfigWatcher};
}
