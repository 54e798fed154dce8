//! Change notification: listener bookkeeping and the pull-based watcher.

pub mod subscriber;
pub mod watcher;

pub use subscriber::ListenerRegistry;
pub use watcher::ApolloWatcher;
