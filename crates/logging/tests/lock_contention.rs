// crates/logging/tests/lock_contention.rs
#![cfg(unix)]

use logging::{FileHandler, FileHandlerConfig, HandlerError, PathEnv};
use std::fs;
use tempfile::tempdir;

#[test]
fn held_lock_moves_to_next_unique() {
    let dir = tempdir().unwrap();
    let env = PathEnv::with_temp_dir(dir.path());
    let cfg = FileHandlerConfig::builder().pattern("%t/app%u.log").build();
    let first = FileHandler::open(&cfg, &env).unwrap();
    let second = FileHandler::open(&cfg, &env).unwrap();
    assert_eq!(first.unique(), 0);
    assert_eq!(second.unique(), 1);
    assert_eq!(second.log_path().unwrap(), dir.path().join("app1.log"));
    drop(first);
    assert!(!dir.path().join("app0.log.lck").exists());
    assert!(dir.path().join("app1.log.lck").exists());
}

#[test]
fn stale_lock_file_is_reused() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("app.log.lck"), b"").unwrap();
    let cfg = FileHandlerConfig::builder().pattern("%t/app.log").build();
    let handler = FileHandler::open(&cfg, &PathEnv::with_temp_dir(dir.path())).unwrap();
    assert_eq!(handler.unique(), 0);
    drop(handler);
    assert!(!dir.path().join("app.log.lck").exists());
}

#[test]
fn exhausted_locks_report_unavailable() {
    let dir = tempdir().unwrap();
    let env = PathEnv::with_temp_dir(dir.path());
    let cfg = FileHandlerConfig::builder()
        .pattern("%t/app%u.log")
        .max_locks(1)
        .build();
    let _held = FileHandler::open(&cfg, &env).unwrap();
    let err = FileHandler::open(&cfg, &env).unwrap_err();
    assert!(matches!(err, HandlerError::LockUnavailable { attempts: 1, .. }));
    assert_eq!(err.outcome(), None);
}

#[test]
fn directory_on_lock_path_moves_to_next_unique() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("app0.log.lck")).unwrap();
    let cfg = FileHandlerConfig::builder().pattern("%t/app%u.log").build();
    let handler = FileHandler::open(&cfg, &PathEnv::with_temp_dir(dir.path())).unwrap();
    assert_eq!(handler.unique(), 1);
    assert!(dir.path().join("app0.log.lck").is_dir());
}

#[test]
fn symlinked_lock_path_is_not_followed() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("target");
    fs::write(&target, b"keep").unwrap();
    std::os::unix::fs::symlink(&target, dir.path().join("app0.log.lck")).unwrap();
    let cfg = FileHandlerConfig::builder().pattern("%t/app%u.log").build();
    let handler = FileHandler::open(&cfg, &PathEnv::with_temp_dir(dir.path())).unwrap();
    assert_eq!(handler.unique(), 1);
    drop(handler);
    assert_eq!(fs::read(&target).unwrap(), b"keep");
    assert!(fs::symlink_metadata(dir.path().join("app0.log.lck")).is_ok());
}
