// src/fixture.rs

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use logging::Outcome;
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cleanup::{CleanupError, ExitCleanup, remove_tree, set_writable};

pub const WRITABLE_DIR: &str = "writable-dir";
pub const NON_WRITABLE_DIR: &str = "non-writable-dir";
pub const NOT_A_DIR: &str = "not-a-dir";
pub const NON_EXISTENT_DIR: &str = "non-existent-dir";

const PROBE_NAME: &str = ".lockcheck-probe";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FixtureKind {
    WritableDir,
    NonWritableDir,
    NonDirectoryFile,
    AbsentPath,
}

impl FixtureKind {
    /// Every kind, in the order the checks run.
    pub const ALL: [FixtureKind; 4] = [
        FixtureKind::WritableDir,
        FixtureKind::NonWritableDir,
        FixtureKind::NonDirectoryFile,
        FixtureKind::AbsentPath,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            FixtureKind::WritableDir => WRITABLE_DIR,
            FixtureKind::NonWritableDir => NON_WRITABLE_DIR,
            FixtureKind::NonDirectoryFile => NOT_A_DIR,
            FixtureKind::AbsentPath => NON_EXISTENT_DIR,
        }
    }

    /// The outcome a log file directly below this fixture must produce.
    pub const fn expected(self) -> Outcome {
        match self {
            FixtureKind::WritableDir => Outcome::Success,
            FixtureKind::NonWritableDir => Outcome::PermissionDenied,
            FixtureKind::NonDirectoryFile => Outcome::NotADirectory,
            FixtureKind::AbsentPath => Outcome::NotFound,
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FixtureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Serialized by its entry name in the scratch directory.
impl Serialize for FixtureKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fixture {
    pub name: &'static str,
    pub path: PathBuf,
    pub kind: FixtureKind,
    pub requires_cleanup: bool,
}

impl Fixture {
    fn new(scratch: &Path, kind: FixtureKind) -> Self {
        Self {
            name: kind.name(),
            path: scratch.join(kind.name()),
            kind,
            requires_cleanup: kind != FixtureKind::AbsentPath,
        }
    }

    /// Log pattern placing `log.log` inside this fixture, relative to `%t`.
    pub fn log_pattern(&self) -> String {
        format!("%t/{}/log.log", self.name)
    }
}

/// Whether directory write permission could actually be revoked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PermissionCheck {
    Supported,
    Unsupported { reason: String },
}

impl PermissionCheck {
    pub fn is_supported(&self) -> bool {
        matches!(self, PermissionCheck::Supported)
    }
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("scratch directory {} is not a directory", .0.display())]
    Scratch(PathBuf),
    #[error("test setup failed: unable to create {what} {}: {source}", .path.display())]
    Create {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("test setup failed: unable to remove stale {}: {source}", .path.display())]
    RemoveStale {
        path: PathBuf,
        #[source]
        source: CleanupError,
    },
}

/// The fixtures of one run, plus the deferred cleanup that owns them.
#[derive(Debug)]
pub struct Setup {
    scratch: PathBuf,
    fixtures: Vec<Fixture>,
    permission_check: PermissionCheck,
    cleanup: ExitCleanup,
}

impl Setup {
    pub fn scratch(&self) -> &Path {
        &self.scratch
    }

    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    pub fn fixture(&self, kind: FixtureKind) -> &Fixture {
        &self.fixtures[kind.index()]
    }

    /// The writable directory, which the caller deletes right after use.
    pub fn writable_dir(&self) -> &Fixture {
        self.fixture(FixtureKind::WritableDir)
    }

    pub fn permission_check(&self) -> &PermissionCheck {
        &self.permission_check
    }

    pub fn deferred(&self) -> &[PathBuf] {
        self.cleanup.registered()
    }

    /// Run the deferred cleanup now and report the first failure.
    pub fn finish(self) -> Result<(), CleanupError> {
        self.cleanup.finish()
    }
}

/// Create the fixtures below `scratch`.
///
/// Entries left over from an earlier run are reused. Failing to revoke
/// write permission on `non-writable-dir` is not an error: it is recorded
/// in [`Setup::permission_check`] and logged as a warning.
pub fn setup(scratch: &Path) -> Result<Setup, SetupError> {
    if !scratch.is_dir() {
        return Err(SetupError::Scratch(scratch.to_path_buf()));
    }
    let fixtures: Vec<Fixture> = FixtureKind::ALL
        .iter()
        .map(|&kind| Fixture::new(scratch, kind))
        .collect();
    let mut cleanup = ExitCleanup::default();

    let writable = &fixtures[FixtureKind::WritableDir.index()].path;
    create_entry(writable, true).map_err(|source| SetupError::Create {
        what: "writable working directory",
        path: writable.clone(),
        source,
    })?;

    let not_a_dir = &fixtures[FixtureKind::NonDirectoryFile.index()].path;
    create_entry(not_a_dir, false).map_err(|source| SetupError::Create {
        what: "plain working file",
        path: not_a_dir.clone(),
        source,
    })?;
    cleanup.register(not_a_dir);

    let non_writable = &fixtures[FixtureKind::NonWritableDir.index()].path;
    create_entry(non_writable, true).map_err(|source| SetupError::Create {
        what: "non-writable working directory",
        path: non_writable.clone(),
        source,
    })?;
    cleanup.register(non_writable);
    let permission_check = revoke_write(non_writable);
    if let PermissionCheck::Unsupported { reason } = &permission_check {
        warn!(
            "unable to make working directory {} non-writable on platform {}: {reason}",
            non_writable.display(),
            std::env::consts::OS
        );
    }

    let absent = &fixtures[FixtureKind::AbsentPath.index()].path;
    ensure_absent(absent)?;

    info!(scratch = %scratch.display(), "fixtures ready");
    Ok(Setup {
        scratch: scratch.to_path_buf(),
        fixtures,
        permission_check,
        cleanup,
    })
}

/// Create a directory or an empty file. An existing entry counts as
/// created.
fn create_entry(path: &Path, directory: bool) -> io::Result<()> {
    if fs::symlink_metadata(path).is_ok() {
        debug!(path = %path.display(), "reusing existing fixture");
        return Ok(());
    }
    let created = if directory {
        fs::create_dir(path)
    } else {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map(drop)
    };
    match created {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

/// Revoke write permission on `dir` and confirm it is enforced by trying
/// to create a file inside it.
fn revoke_write(dir: &Path) -> PermissionCheck {
    if let Err(e) = set_writable(dir, false) {
        return PermissionCheck::Unsupported {
            reason: format!("cannot change permissions: {e}"),
        };
    }
    let probe = dir.join(PROBE_NAME);
    match OpenOptions::new().write(true).create_new(true).open(&probe) {
        Err(e) if e.kind() == ErrorKind::PermissionDenied => PermissionCheck::Supported,
        Err(e) => PermissionCheck::Unsupported {
            reason: format!("write probe failed: {e}"),
        },
        Ok(file) => {
            drop(file);
            if let Err(e) = fs::remove_file(&probe) {
                debug!(path = %probe.display(), "failed to remove write probe: {e}");
            }
            PermissionCheck::Unsupported {
                reason: "directory stayed writable".to_string(),
            }
        }
    }
}

fn ensure_absent(path: &Path) -> Result<(), SetupError> {
    if fs::symlink_metadata(path).is_err() {
        return Ok(());
    }
    debug!(path = %path.display(), "removing stale fixture");
    if path.is_dir() {
        if let Err(e) = set_writable(path, true) {
            debug!(path = %path.display(), "failed to restore write permission: {e}");
        }
    }
    remove_tree(path).map_err(|source| SetupError::RemoveStale {
        path: path.to_path_buf(),
        source,
    })
}
