// src/cleanup.rs

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// Error raised when a fixture cannot be deleted.
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("failed to delete {}: {source}", .path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to restore write permission on {}: {source}", .path.display())]
    Permissions {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn delete_error(path: &Path, source: io::Error) -> CleanupError {
    CleanupError::Delete {
        path: path.to_path_buf(),
        source,
    }
}

/// Delete `path` and everything below it, children before parents.
///
/// Symlinks are removed, never followed. The first failure stops the walk.
pub fn remove_tree(path: &Path) -> Result<(), CleanupError> {
    let md = fs::symlink_metadata(path).map_err(|e| delete_error(path, e))?;
    if md.is_dir() {
        for entry in fs::read_dir(path).map_err(|e| delete_error(path, e))? {
            let entry = entry.map_err(|e| delete_error(path, e))?;
            remove_tree(&entry.path())?;
        }
        fs::remove_dir(path).map_err(|e| delete_error(path, e))?;
    } else {
        fs::remove_file(path).map_err(|e| delete_error(path, e))?;
    }
    debug!(path = %path.display(), "deleted");
    Ok(())
}

pub(crate) fn set_writable(path: &Path, writable: bool) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = if writable { 0o755 } else { 0o555 };
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
    }
    #[cfg(not(unix))]
    {
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_readonly(!writable);
        fs::set_permissions(path, perms)
    }
}

/// Delete a registered entry. An entry that is already gone counts as
/// deleted; directories get their write permission back first.
fn remove_entry(path: &Path) -> Result<(), CleanupError> {
    let md = match fs::symlink_metadata(path) {
        Ok(md) => md,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(delete_error(path, e)),
    };
    if md.is_dir() {
        set_writable(path, true).map_err(|source| CleanupError::Permissions {
            path: path.to_path_buf(),
            source,
        })?;
    }
    remove_tree(path)
}

/// Paths deleted once the run is over.
///
/// [`ExitCleanup::finish`] reports failures. Dropping the list without
/// calling it still deletes everything, logging whatever could not be
/// removed.
#[derive(Debug, Default)]
pub struct ExitCleanup {
    paths: Vec<PathBuf>,
}

impl ExitCleanup {
    pub fn register(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    pub fn registered(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Delete every registered path, newest first, and return the first
    /// failure. Later entries are still attempted after a failure.
    pub fn finish(mut self) -> Result<(), CleanupError> {
        let mut first = None;
        for path in std::mem::take(&mut self.paths).iter().rev() {
            if let Err(e) = remove_entry(path) {
                warn!("{e}");
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }
}

impl Drop for ExitCleanup {
    fn drop(&mut self) {
        for path in self.paths.drain(..).rev() {
            if let Err(e) = remove_entry(&path) {
                warn!("deferred cleanup: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn remove_tree_deletes_nested_entries() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/b/file"), b"x").unwrap();
        fs::write(root.join("top"), b"y").unwrap();
        remove_tree(&root).unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn remove_tree_reports_missing_path() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = remove_tree(&missing).unwrap_err();
        assert!(matches!(err, CleanupError::Delete { ref path, .. } if path == &missing));
        assert!(err.to_string().starts_with("failed to delete"));
    }

    #[test]
    fn finish_deletes_registered_paths() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file");
        let ro = dir.path().join("ro");
        fs::write(&file, b"").unwrap();
        fs::create_dir(&ro).unwrap();
        set_writable(&ro, false).unwrap();
        let mut cleanup = ExitCleanup::default();
        cleanup.register(&file);
        cleanup.register(&ro);
        cleanup.register(dir.path().join("never-created"));
        cleanup.finish().unwrap();
        assert!(!file.exists());
        assert!(!ro.exists());
    }

    #[test]
    fn drop_deletes_registered_paths() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, b"").unwrap();
        {
            let mut cleanup = ExitCleanup::default();
            cleanup.register(&file);
            assert_eq!(cleanup.registered(), &[file.clone()]);
        }
        assert!(!file.exists());
    }
}
