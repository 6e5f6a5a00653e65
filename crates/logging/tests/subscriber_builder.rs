// crates/logging/tests/subscriber_builder.rs

use logging::{FileHandlerConfig, LogFormat, PathEnv, SubscriberConfig};

#[test]
fn builder_sets_fields() {
    let handler = FileHandlerConfig::builder()
        .pattern("%t/app%g.log")
        .limit(1024)
        .count(4)
        .append(true)
        .max_locks(3)
        .build();
    let cfg = SubscriberConfig::builder()
        .format(LogFormat::Json)
        .verbose(2)
        .quiet(true)
        .log_file(Some((handler.clone(), LogFormat::Json)))
        .path_env(PathEnv::with_temp_dir("/scratch"))
        .colored(false)
        .timestamps(true)
        .build();

    assert_eq!(cfg.format, LogFormat::Json);
    assert_eq!(cfg.verbose, 2);
    assert!(cfg.quiet);
    assert_eq!(cfg.log_file, Some((handler, LogFormat::Json)));
    assert_eq!(cfg.path_env.temp_dir(), std::path::Path::new("/scratch"));
    assert!(!cfg.colored);
    assert!(cfg.timestamps);
}

#[test]
fn handler_defaults() {
    let cfg = FileHandlerConfig::default();
    assert_eq!(cfg.pattern, "%h/log%u.log");
    assert_eq!(cfg.limit, 0);
    assert_eq!(cfg.count, 1);
    assert!(!cfg.append);
    assert_eq!(cfg.max_locks, 100);
}
