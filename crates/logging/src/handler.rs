// crates/logging/src/handler.rs

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{HandlerError, Result};
use crate::pattern::{LogPattern, PathEnv};

#[cfg(unix)]
type LockGuard = nix::fcntl::Flock<File>;
#[cfg(not(unix))]
type LockGuard = File;

const LOCK_SUFFIX: &str = ".lck";

/// Settings for a [`FileHandler`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileHandlerConfig {
    pub pattern: String,
    /// Rotate once this many bytes have been written. Zero disables rotation.
    pub limit: u64,
    /// Number of generations kept when rotating.
    pub count: u32,
    pub append: bool,
    /// How many `unique` numbers are tried before giving up on a lock.
    pub max_locks: u32,
}

impl Default for FileHandlerConfig {
    fn default() -> Self {
        Self {
            pattern: "%h/log%u.log".to_string(),
            limit: 0,
            count: 1,
            append: false,
            max_locks: 100,
        }
    }
}

impl FileHandlerConfig {
    pub fn builder() -> FileHandlerConfigBuilder {
        FileHandlerConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
#[must_use]
pub struct FileHandlerConfigBuilder {
    cfg: FileHandlerConfig,
}

impl FileHandlerConfigBuilder {
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.cfg.pattern = pattern.into();
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.cfg.limit = limit;
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.cfg.count = count;
        self
    }

    pub fn append(mut self, append: bool) -> Self {
        self.cfg.append = append;
        self
    }

    pub fn max_locks(mut self, max_locks: u32) -> Self {
        self.cfg.max_locks = max_locks;
        self
    }

    pub fn build(self) -> FileHandlerConfig {
        self.cfg
    }
}

/// A log file opened from a [`LogPattern`], guarded by a `.lck` file.
///
/// The lock file lives next to generation 0 of the log, so an invalid
/// directory in the pattern is reported while the lock is acquired and
/// before any log file is touched.
pub struct FileHandler {
    pattern: LogPattern,
    env: PathEnv,
    limit: u64,
    count: u32,
    unique: u32,
    lock_path: PathBuf,
    lock: Option<LockGuard>,
    file: Option<File>,
    written: u64,
}

impl FileHandler {
    pub fn open(cfg: &FileHandlerConfig, env: &PathEnv) -> Result<Self> {
        let pattern = LogPattern::parse(&cfg.pattern)?;
        let count = cfg.count.max(1);
        let attempts = cfg.max_locks.max(1);
        for unique in 0..attempts {
            let base = pattern.expand(0, unique, count, env)?;
            let lock_path = lock_path_for(&base);
            check_lock_location(&lock_path)?;
            let Some(guard) = acquire_lock(&lock_path)? else {
                debug!(lock = %lock_path.display(), "lock held, trying next unique");
                continue;
            };
            debug!(lock = %lock_path.display(), unique, "acquired log lock");
            let mut handler = FileHandler {
                pattern,
                env: env.clone(),
                limit: cfg.limit,
                count,
                unique,
                lock_path,
                lock: Some(guard),
                file: None,
                written: 0,
            };
            handler.open_files(cfg.append)?;
            return Ok(handler);
        }
        Err(HandlerError::LockUnavailable {
            pattern: cfg.pattern.clone(),
            attempts,
        })
    }

    /// Path of the generation currently being written.
    pub fn log_path(&self) -> Result<PathBuf> {
        self.generation_path(0)
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    pub fn unique(&self) -> u32 {
        self.unique
    }

    pub fn pattern(&self) -> &LogPattern {
        &self.pattern
    }

    /// Append one record, rotating afterwards if the limit was reached.
    pub fn publish(&mut self, record: &[u8]) -> Result<()> {
        let path = self.log_path()?;
        let file = self.file.as_mut().ok_or_else(|| {
            HandlerError::io(&path, io::Error::other("log file handler is closed"))
        })?;
        file.write_all(record).map_err(|e| HandlerError::io(&path, e))?;
        self.written += record.len() as u64;
        if self.limit > 0 && self.written >= self.limit {
            self.rotate()?;
        }
        Ok(())
    }

    /// Flush the log, release the lock and remove the lock file.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            if let Err(e) = file.flush() {
                let path = self.log_path()?;
                return Err(HandlerError::io(&path, e));
            }
        }
        if self.lock.take().is_some() {
            match fs::remove_file(&self.lock_path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(HandlerError::io(&self.lock_path, e)),
            }
            debug!(lock = %self.lock_path.display(), "released log lock");
        }
        Ok(())
    }

    fn generation_path(&self, generation: u32) -> Result<PathBuf> {
        self.pattern.expand(generation, self.unique, self.count, &self.env)
    }

    fn open_files(&mut self, append: bool) -> Result<()> {
        let path = self.log_path()?;
        if append {
            let len = match fs::metadata(&path) {
                Ok(md) => md.len(),
                Err(e) if e.kind() == ErrorKind::NotFound => 0,
                Err(e) => return Err(HandlerError::classify(&path, e)),
            };
            if self.limit == 0 || len < self.limit {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .map_err(|e| HandlerError::classify(&path, e))?;
                self.file = Some(file);
                self.written = len;
                return Ok(());
            }
        }
        self.rotate()
    }

    /// Shift every generation up by one and start a fresh generation 0.
    fn rotate(&mut self) -> Result<()> {
        self.file = None;
        for generation in (0..self.count.saturating_sub(1)).rev() {
            let from = self.generation_path(generation)?;
            let to = self.generation_path(generation + 1)?;
            match fs::rename(&from, &to) {
                Ok(()) => trace!(from = %from.display(), to = %to.display(), "rotated log"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(HandlerError::io(&from, e)),
            }
        }
        let path = self.log_path()?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| HandlerError::classify(&path, e))?;
        self.file = Some(file);
        self.written = 0;
        Ok(())
    }
}

impl fmt::Debug for FileHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandler")
            .field("pattern", &self.pattern)
            .field("unique", &self.unique)
            .field("lock_path", &self.lock_path)
            .field("locked", &self.lock.is_some())
            .field("written", &self.written)
            .finish_non_exhaustive()
    }
}

impl Write for FileHandler {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.publish(buf).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for FileHandler {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            debug!("failed to close log handler: {e}");
        }
    }
}

fn lock_path_for(base: &Path) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(LOCK_SUFFIX);
    PathBuf::from(name)
}

fn lock_dir(lock_path: &Path) -> &Path {
    match lock_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Check that the directory holding `lock_path` exists and is a directory.
///
/// Write access is checked when the lock file is created.
pub fn check_lock_location(lock_path: &Path) -> Result<()> {
    let dir = lock_dir(lock_path);
    match fs::metadata(dir) {
        Ok(md) if md.is_dir() => Ok(()),
        Ok(_) => Err(HandlerError::NotADirectory {
            path: dir.to_path_buf(),
        }),
        Err(e) => Err(HandlerError::classify(dir, e)),
    }
}

fn acquire_lock(lock_path: &Path) -> Result<Option<LockGuard>> {
    match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(lock_path)
    {
        Ok(file) => try_lock(file).map_err(|e| HandlerError::io(lock_path, e)),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            if is_regular_file(lock_path) {
                reuse_stale_lock(lock_path)
            } else {
                debug!(lock = %lock_path.display(), "lock path is not a regular file");
                Ok(None)
            }
        }
        Err(e) => Err(HandlerError::classify(lock_dir(lock_path), e)),
    }
}

/// Directories and symlinks squatting on a lock path are never opened.
fn is_regular_file(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|md| md.is_file())
}

#[cfg(unix)]
fn try_lock(file: File) -> io::Result<Option<LockGuard>> {
    use nix::errno::Errno;
    use nix::fcntl::{Flock, FlockArg};

    match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
        Ok(guard) => Ok(Some(guard)),
        Err((_, errno)) if errno == Errno::EWOULDBLOCK => Ok(None),
        Err((_, errno)) => Err(io::Error::from(errno)),
    }
}

#[cfg(not(unix))]
fn try_lock(file: File) -> io::Result<Option<LockGuard>> {
    Ok(Some(file))
}

/// A lock file left behind by a process that is gone can be taken over.
#[cfg(unix)]
fn reuse_stale_lock(lock_path: &Path) -> Result<Option<LockGuard>> {
    let file = match OpenOptions::new().write(true).open(lock_path) {
        Ok(file) => file,
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
            return Ok(None);
        }
        Err(e) => return Err(HandlerError::io(lock_path, e)),
    };
    let guard = try_lock(file).map_err(|e| HandlerError::io(lock_path, e))?;
    if guard.is_some() {
        debug!(lock = %lock_path.display(), "reusing stale lock file");
    }
    Ok(guard)
}

#[cfg(not(unix))]
fn reuse_stale_lock(lock_path: &Path) -> Result<Option<LockGuard>> {
    if fs::remove_file(lock_path).is_err() {
        return Ok(None);
    }
    match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(lock_path)
    {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(HandlerError::classify(lock_dir(lock_path), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_path_appends_suffix() {
        assert_eq!(
            lock_path_for(Path::new("/tmp/a/log.log")),
            PathBuf::from("/tmp/a/log.log.lck")
        );
    }

    #[test]
    fn bare_file_name_locks_in_current_dir() {
        assert_eq!(lock_dir(Path::new("log.lck")), Path::new("."));
    }
}
