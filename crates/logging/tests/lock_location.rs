// crates/logging/tests/lock_location.rs

use logging::{FileHandler, FileHandlerConfig, HandlerError, Outcome, PathEnv};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn open(scratch: &Path, pattern: &str) -> Result<FileHandler, HandlerError> {
    let cfg = FileHandlerConfig::builder().pattern(pattern).build();
    FileHandler::open(&cfg, &PathEnv::with_temp_dir(scratch))
}

#[test]
fn writable_directory_opens() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("writable-dir")).unwrap();
    let handler = open(dir.path(), "%t/writable-dir/log.log").unwrap();
    let log = dir.path().join("writable-dir").join("log.log");
    assert_eq!(handler.log_path().unwrap(), log);
    assert_eq!(handler.lock_path(), dir.path().join("writable-dir/log.log.lck"));
    assert!(log.exists());
    assert!(handler.lock_path().exists());
    drop(handler);
    assert!(log.exists());
    assert!(!dir.path().join("writable-dir/log.log.lck").exists());
}

#[test]
fn plain_file_parent_is_not_a_directory() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("not-a-dir"), b"").unwrap();
    let err = open(dir.path(), "%t/not-a-dir/log.log").unwrap_err();
    assert_eq!(err.outcome(), Some(Outcome::NotADirectory));
    assert!(err.to_string().contains("not a directory"), "{err}");
}

#[test]
fn file_deeper_in_the_path_is_not_a_directory() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("not-a-dir"), b"").unwrap();
    let err = open(dir.path(), "%t/not-a-dir/nested/log.log").unwrap_err();
    assert_eq!(err.outcome(), Some(Outcome::NotADirectory));
}

#[test]
fn absent_parent_is_not_found() {
    let dir = tempdir().unwrap();
    let err = open(dir.path(), "%t/non-existent-dir/log.log").unwrap_err();
    assert_eq!(err.outcome(), Some(Outcome::NotFound));
    assert!(!dir.path().join("non-existent-dir").exists());
}

#[cfg(unix)]
#[test]
fn read_only_parent_is_permission_denied() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let ro = dir.path().join("non-writable-dir");
    fs::create_dir(&ro).unwrap();
    fs::set_permissions(&ro, fs::Permissions::from_mode(0o555)).unwrap();
    let enforced = fs::File::create(ro.join("probe")).is_err();
    let _ = fs::remove_file(ro.join("probe"));
    let result = open(dir.path(), "%t/non-writable-dir/log.log");
    fs::set_permissions(&ro, fs::Permissions::from_mode(0o755)).unwrap();
    if !enforced {
        eprintln!("skipping: directory permissions are not enforced for this user");
        return;
    }
    let err = result.unwrap_err();
    assert_eq!(err.outcome(), Some(Outcome::PermissionDenied));
    assert!(matches!(err, HandlerError::PermissionDenied { ref path, .. } if path == &ro));
}

#[test]
fn check_lock_location_accepts_existing_directory() {
    let dir = tempdir().unwrap();
    logging::check_lock_location(&dir.path().join("x.lck")).unwrap();
}
