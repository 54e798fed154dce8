//! Local backup directory preparation.

use super::options::DEFAULT_BACKUP_PATH;
use std::fs::DirBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Resolve a backup path against `base`.
///
/// Absolute paths are returned as is. An empty path resolves to
/// [`DEFAULT_BACKUP_PATH`] under `base`.
pub fn resolve_backup_dir(base: &Path, path: &Path) -> PathBuf {
    if path.as_os_str().is_empty() {
        base.join(DEFAULT_BACKUP_PATH)
    } else {
        base.join(path)
    }
}

/// Resolve a backup path against the process working directory.
///
/// If the working directory cannot be determined the path is returned
/// unresolved.
pub fn resolve_from_cwd(path: &Path) -> PathBuf {
    match std::env::current_dir() {
        Ok(cwd) => resolve_backup_dir(&cwd, path),
        Err(e) => {
            warn!("Unable to determine working directory, using backup path as given: {}", e);
            resolve_backup_dir(Path::new(""), path)
        }
    }
}

/// Make sure the backup directory exists.
///
/// Existing directories are left untouched. Failures are logged and
/// swallowed: the remote client validates its own backup path.
///
/// Returns true if the directory exists afterwards.
pub fn ensure_backup_dir(path: &Path) -> bool {
    if path.is_dir() {
        return true;
    }

    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o777);
    }

    match builder.create(path) {
        Ok(()) => {
            debug!("Created backup directory {}", path.display());
            true
        }
        Err(e) => {
            warn!(
                "Failed to create backup directory {}: {}",
                path.display(),
                e
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_relative() {
        let resolved = resolve_backup_dir(Path::new("/srv/app"), Path::new("cache"));
        assert_eq!(resolved, PathBuf::from("/srv/app/cache"));
    }

    #[test]
    fn test_resolve_absolute() {
        let resolved = resolve_backup_dir(Path::new("/srv/app"), Path::new("/tmp/apollo"));
        assert_eq!(resolved, PathBuf::from("/tmp/apollo"));
    }

    #[test]
    fn test_resolve_empty_uses_default() {
        let resolved = resolve_backup_dir(Path::new("/srv/app"), Path::new(""));
        assert_eq!(resolved, PathBuf::from("/srv/app/cache"));
    }

    #[test]
    fn test_resolve_from_cwd_is_absolute() {
        let resolved = resolve_from_cwd(Path::new("cache"));
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("cache"));
    }

    #[test]
    fn test_creates_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("cache");

        assert!(ensure_backup_dir(&path));
        assert!(path.is_dir());
    }

    #[test]
    fn test_existing_dir_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let marker = temp_dir.path().join("application.json");
        fs::write(&marker, "{}").unwrap();

        assert!(ensure_backup_dir(temp_dir.path()));
        assert_eq!(fs::read_to_string(&marker).unwrap(), "{}");
    }

    #[test]
    fn test_failure_is_swallowed() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not-a-dir");
        fs::write(&file, "").unwrap();

        assert!(!ensure_backup_dir(&file.join("cache")));
    }
}
