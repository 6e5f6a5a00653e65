// crates/logging/tests/log_file.rs

use logging::{FileHandlerConfig, LogFormat, PathEnv, SubscriberConfig, subscriber};
use tempfile::tempdir;
use tracing::info;

#[test]
fn file_sink_writes_message() {
    let dir = tempdir().unwrap();
    let handler = FileHandlerConfig::builder().pattern("%t/log.txt").build();
    let cfg = SubscriberConfig::builder()
        .format(LogFormat::Text)
        .verbose(1)
        .quiet(false)
        .log_file(Some((handler, LogFormat::Text)))
        .path_env(PathEnv::with_temp_dir(dir.path()))
        .colored(false)
        .timestamps(false)
        .build();
    let sub = subscriber(cfg).unwrap();
    tracing::subscriber::with_default(sub, || {
        info!(target: "test", "hello");
        assert!(dir.path().join("log.txt.lck").exists());
    });
    let contents = std::fs::read_to_string(dir.path().join("log.txt")).unwrap();
    assert!(contents.contains("INFO test: hello"));
}

#[test]
fn dropping_subscriber_releases_lock() {
    let dir = tempdir().unwrap();
    let handler = FileHandlerConfig::builder().pattern("%t/run.log").build();
    let cfg = SubscriberConfig::builder()
        .log_file(Some((handler, LogFormat::Text)))
        .path_env(PathEnv::with_temp_dir(dir.path()))
        .build();
    let sub = subscriber(cfg).unwrap();
    assert!(dir.path().join("run.log.lck").exists());
    drop(sub);
    assert!(!dir.path().join("run.log.lck").exists());
    assert!(dir.path().join("run.log").exists());
}
