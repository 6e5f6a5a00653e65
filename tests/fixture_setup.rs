// tests/fixture_setup.rs

use lockcheck::{FixtureKind, Outcome, PermissionCheck, SetupError, setup};
use std::fs;
use tempfile::tempdir;

#[test]
fn creates_one_fixture_per_kind() {
    let dir = tempdir().unwrap();
    let fixtures = setup(dir.path()).unwrap();
    assert_eq!(fixtures.fixtures().len(), 4);
    for kind in FixtureKind::ALL {
        let fixture = fixtures.fixture(kind);
        assert_eq!(fixture.kind, kind);
        assert_eq!(fixture.path, dir.path().join(kind.name()));
        assert_eq!(fixture.requires_cleanup, kind != FixtureKind::AbsentPath);
    }
    assert!(dir.path().join("writable-dir").is_dir());
    assert!(dir.path().join("non-writable-dir").is_dir());
    assert!(dir.path().join("not-a-dir").is_file());
    assert!(!dir.path().join("non-existent-dir").exists());
    assert_eq!(fixtures.writable_dir().name, "writable-dir");
    assert_eq!(
        fixtures.deferred(),
        &[dir.path().join("not-a-dir"), dir.path().join("non-writable-dir")]
    );
    fixtures.finish().unwrap();
    fs::remove_dir(dir.path().join("writable-dir")).unwrap();
}

#[test]
fn expected_outcomes_per_kind() {
    assert_eq!(FixtureKind::WritableDir.expected(), Outcome::Success);
    assert_eq!(FixtureKind::NonWritableDir.expected(), Outcome::PermissionDenied);
    assert_eq!(FixtureKind::NonDirectoryFile.expected(), Outcome::NotADirectory);
    assert_eq!(FixtureKind::AbsentPath.expected(), Outcome::NotFound);
}

#[test]
fn log_pattern_uses_temp_token() {
    let dir = tempdir().unwrap();
    let fixtures = setup(dir.path()).unwrap();
    assert_eq!(
        fixtures.fixture(FixtureKind::NonDirectoryFile).log_pattern(),
        "%t/not-a-dir/log.log"
    );
}

#[test]
fn setup_twice_reuses_leftovers() {
    let dir = tempdir().unwrap();
    let first = setup(dir.path()).unwrap();
    let check = first.permission_check().clone();
    std::mem::forget(first);
    let second = setup(dir.path()).unwrap();
    assert_eq!(second.permission_check(), &check);
    assert!(dir.path().join("not-a-dir").is_file());
    second.finish().unwrap();
    assert!(!dir.path().join("not-a-dir").exists());
    assert!(!dir.path().join("non-writable-dir").exists());
}

#[test]
fn stale_absent_path_is_removed() {
    let dir = tempdir().unwrap();
    let stale = dir.path().join("non-existent-dir");
    fs::create_dir_all(stale.join("nested")).unwrap();
    fs::write(stale.join("nested/file"), b"x").unwrap();
    let fixtures = setup(dir.path()).unwrap();
    assert!(!stale.exists());
    drop(fixtures);
}

#[test]
fn dropping_setup_runs_deferred_cleanup() {
    let dir = tempdir().unwrap();
    drop(setup(dir.path()).unwrap());
    assert!(!dir.path().join("not-a-dir").exists());
    assert!(!dir.path().join("non-writable-dir").exists());
    assert!(dir.path().join("writable-dir").exists());
}

#[test]
fn missing_scratch_directory_fails() {
    let dir = tempdir().unwrap();
    let err = setup(&dir.path().join("missing")).unwrap_err();
    assert!(matches!(err, SetupError::Scratch(_)));
}

#[test]
fn file_as_scratch_fails() {
    let dir = tempdir().unwrap();
    let scratch = dir.path().join("file-scratch");
    fs::write(&scratch, b"").unwrap();
    assert!(matches!(setup(&scratch), Err(SetupError::Scratch(_))));
}

#[cfg(unix)]
#[test]
fn unwritable_scratch_is_fatal() {
    use nix::unistd::Uid;
    use std::os::unix::fs::PermissionsExt;

    if Uid::effective().is_root() {
        return;
    }
    let dir = tempdir().unwrap();
    let scratch = dir.path().join("scratch");
    fs::create_dir(&scratch).unwrap();
    fs::set_permissions(&scratch, fs::Permissions::from_mode(0o555)).unwrap();
    let result = setup(&scratch);
    fs::set_permissions(&scratch, fs::Permissions::from_mode(0o755)).unwrap();
    let err = result.unwrap_err();
    assert!(matches!(
        err,
        SetupError::Create { what: "writable working directory", .. }
    ));
    assert!(err.to_string().contains("unable to create writable working directory"));
}

#[cfg(unix)]
#[test]
fn permission_check_matches_privileges() {
    use nix::unistd::Uid;

    let dir = tempdir().unwrap();
    let fixtures = setup(dir.path()).unwrap();
    if Uid::effective().is_root() {
        assert!(matches!(
            fixtures.permission_check(),
            PermissionCheck::Unsupported { .. }
        ));
    } else {
        assert_eq!(fixtures.permission_check(), &PermissionCheck::Supported);
    }
}
