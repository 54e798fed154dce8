//! Configuration source implementations.

mod apollo;
mod config_source;

pub use apollo::ApolloSource;
pub use config_source::{ConfigSource, ConfigWatcher};
