// crates/logging/src/error.rs

use std::fmt;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for opening and writing through a [`crate::FileHandler`].
///
/// The three lock-location failures are kept apart from generic I/O so
/// callers can tell a missing directory from a file standing in for one
/// and from a directory they may not write to.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{}: lock directory not found", .path.display())]
    NotFound { path: PathBuf },
    #[error("{}: not a directory", .path.display())]
    NotADirectory { path: PathBuf },
    #[error("{}: permission denied", .path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{pattern}: no lock file available after {attempts} attempts")]
    LockUnavailable { pattern: String, attempts: u32 },
    #[error("{pattern}: %h used but no home directory is available")]
    NoHomeDir { pattern: String },
    #[error("empty log file pattern")]
    EmptyPattern,
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for handler operations.
pub type Result<T> = std::result::Result<T, HandlerError>;

impl HandlerError {
    /// The precise classification of this error, or `None` when it is not
    /// one of the lock-location failures.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            HandlerError::NotFound { .. } => Some(Outcome::NotFound),
            HandlerError::NotADirectory { .. } => Some(Outcome::NotADirectory),
            HandlerError::PermissionDenied { .. } => Some(Outcome::PermissionDenied),
            _ => None,
        }
    }

    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        HandlerError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Map an I/O error raised while touching `path` onto the handler
    /// taxonomy. `NotFound` and `NotADirectory` are reported against
    /// `path` itself.
    pub(crate) fn classify(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            ErrorKind::NotFound => HandlerError::NotFound {
                path: path.to_path_buf(),
            },
            ErrorKind::NotADirectory => HandlerError::NotADirectory {
                path: path.to_path_buf(),
            },
            ErrorKind::PermissionDenied => HandlerError::PermissionDenied {
                path: path.to_path_buf(),
                source,
            },
            _ => HandlerError::io(path, source),
        }
    }
}

/// Classified result of attempting to open a log file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Success,
    PermissionDenied,
    NotADirectory,
    NotFound,
}

impl Outcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::PermissionDenied => "permission-denied",
            Outcome::NotADirectory => "not-a-directory",
            Outcome::NotFound => "not-found",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
