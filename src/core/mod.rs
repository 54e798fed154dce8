//! Core types: snapshots, source options and backup directory handling.

pub mod backup;
mod options;
mod snapshot;

pub use options::{DEFAULT_BACKUP_PATH, SourceOptions};
pub use snapshot::{ChangeSet, KeyValue, Snapshot};
