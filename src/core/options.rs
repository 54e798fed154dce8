//! Connection options for the Apollo source.

use crate::client::ClientConfig;
use crate::error::{ConfigError, Result};
use config::{Environment, File};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default directory for the client's local backup cache.
pub const DEFAULT_BACKUP_PATH: &str = "cache";

/// Options recognized by [`ApolloSource`](crate::sources::ApolloSource).
///
/// None of the network-facing fields are validated here; the remote client
/// decides whether an app id, endpoint or secret is usable.
///
/// # Examples
///
/// ```rust
/// use apollo_source::core::SourceOptions;
///
/// let options = SourceOptions::new()
///     .with_app_id("order-service")
///     .with_cluster("default")
///     .with_endpoint("http://apollo.internal:8080")
///     .with_namespace("application")
///     .with_enable_backup();
///
/// assert_eq!(options.app_id, "order-service");
/// assert_eq!(options.backup_path.to_str(), Some("cache"));
/// ```
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SourceOptions {
    /// Application identity registered with the config service.
    pub app_id: String,
    /// Access key secret.
    pub secret: String,
    /// Deployment cluster name.
    pub cluster: String,
    /// Config service address.
    pub endpoint: String,
    /// Namespace to read.
    pub namespace: String,
    /// Whether the client persists a local backup of fetched configuration.
    pub enable_backup: bool,
    /// Directory for the backup cache, relative to the working directory
    /// unless absolute.
    pub backup_path: PathBuf,
}

impl SourceOptions {
    /// Create options with defaults: backups disabled, backup path `cache`.
    pub fn new() -> Self {
        Self {
            app_id: String::new(),
            secret: String::new(),
            cluster: String::new(),
            endpoint: String::new(),
            namespace: String::new(),
            enable_backup: false,
            backup_path: PathBuf::from(DEFAULT_BACKUP_PATH),
        }
    }

    /// Load options from a YAML, TOML or JSON file.
    ///
    /// Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, has an unsupported extension,
    /// or does not deserialize into options.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::LoadError(format!(
                "Options file not found: {}",
                path.display()
            )));
        }

        let loaded = config::Config::builder()
            .add_source(File::from(path).required(true))
            .build()
            .map_err(|e| ConfigError::LoadError(format!("Failed to load file: {}", e)))?;

        loaded.try_deserialize::<Self>().map_err(|e| {
            ConfigError::DeserializationError(format!("Failed to parse options file: {}", e))
        })
    }

    /// Load options from environment variables with the given prefix.
    ///
    /// `APOLLO_APP_ID=svc` becomes `app_id = "svc"` for prefix `APOLLO`.
    ///
    /// ```rust,no_run
    /// use apollo_source::core::SourceOptions;
    ///
    /// # fn example() -> apollo_source::error::Result<()> {
    /// let options = SourceOptions::from_env("APOLLO")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_env(prefix: &str) -> Result<Self> {
        let loaded = config::Config::builder()
            .add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| {
                ConfigError::LoadError(format!("Failed to load environment variables: {}", e))
            })?;

        loaded.try_deserialize::<Self>().map_err(|e| {
            ConfigError::DeserializationError(format!(
                "Failed to parse environment variables: {}",
                e
            ))
        })
    }

    /// Set the application id.
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    /// Set the access key secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }

    /// Set the cluster name.
    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = cluster.into();
        self
    }

    /// Set the config service address.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Enable the client's local backup cache.
    pub fn with_enable_backup(mut self) -> Self {
        self.enable_backup = true;
        self
    }

    /// Disable the client's local backup cache.
    pub fn with_disable_backup(mut self) -> Self {
        self.enable_backup = false;
        self
    }

    /// Set the backup cache directory.
    ///
    /// An empty path falls back to [`DEFAULT_BACKUP_PATH`].
    pub fn with_backup_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.backup_path = path.into();
        self
    }

    /// Build the config handed to the remote client at startup.
    pub fn client_config(&self, backup_dir: &Path) -> ClientConfig {
        ClientConfig {
            app_id: self.app_id.clone(),
            cluster: self.cluster.clone(),
            namespace_name: self.namespace.clone(),
            ip: self.endpoint.clone(),
            is_backup_config: self.enable_backup,
            secret: self.secret.clone(),
            backup_config_path: backup_dir.to_path_buf(),
        }
    }
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SourceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceOptions")
            .field("app_id", &self.app_id)
            .field("secret", &if self.secret.is_empty() { "" } else { "***" })
            .field("cluster", &self.cluster)
            .field("endpoint", &self.endpoint)
            .field("namespace", &self.namespace)
            .field("enable_backup", &self.enable_backup)
            .field("backup_path", &self.backup_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let options = SourceOptions::default();
        assert!(options.app_id.is_empty());
        assert!(!options.enable_backup);
        assert_eq!(options.backup_path, PathBuf::from("cache"));
    }

    #[test]
    fn test_backup_toggles() {
        let options = SourceOptions::new().with_enable_backup();
        assert!(options.enable_backup);

        let options = options.with_disable_backup();
        assert!(!options.enable_backup);
    }

    #[test]
    fn test_client_config() {
        let options = SourceOptions::new()
            .with_app_id("svc")
            .with_secret("s3cret")
            .with_cluster("dev")
            .with_endpoint("http://localhost:8080")
            .with_namespace("application")
            .with_enable_backup();

        let cfg = options.client_config(Path::new("/var/cache/apollo"));
        assert_eq!(cfg.app_id, "svc");
        assert_eq!(cfg.secret, "s3cret");
        assert_eq!(cfg.cluster, "dev");
        assert_eq!(cfg.ip, "http://localhost:8080");
        assert_eq!(cfg.namespace_name, "application");
        assert!(cfg.is_backup_config);
        assert_eq!(cfg.backup_config_path, PathBuf::from("/var/cache/apollo"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let options = SourceOptions::new().with_secret("s3cret");
        let rendered = format!("{:?}", options);
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_from_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("apollo.yaml");
        fs::write(
            &path,
            r#"
app_id: order-service
cluster: prod
endpoint: http://apollo:8080
enable_backup: true
"#,
        )
        .unwrap();

        let options = SourceOptions::from_file(&path).unwrap();
        assert_eq!(options.app_id, "order-service");
        assert_eq!(options.cluster, "prod");
        assert_eq!(options.endpoint, "http://apollo:8080");
        assert!(options.enable_backup);
        assert_eq!(options.backup_path, PathBuf::from("cache"));
    }

    #[test]
    fn test_from_missing_file() {
        let result = SourceOptions::from_file("/nonexistent/apollo.yaml");
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
