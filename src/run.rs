// src/run.rs

use logging::{FileHandlerConfig, PathEnv, SubscriberConfig, subscriber};
use tracing::subscriber::with_default;

use crate::check::{CheckError, CheckReport, run_checks};
use crate::config::CheckConfig;
use crate::fixture::setup;

/// Resolve the scratch directory, install the configured subscriber for
/// the duration of the run and execute every check.
pub fn check_with_config(cfg: &CheckConfig) -> Result<CheckReport, CheckError> {
    let env = match &cfg.scratch_dir {
        Some(dir) => PathEnv::with_temp_dir(dir),
        None => PathEnv::from_system(),
    };
    let log_file = cfg.log_file.as_ref().map(|(pattern, format)| {
        (
            FileHandlerConfig::builder().pattern(pattern).append(true).build(),
            *format,
        )
    });
    let sub_cfg = SubscriberConfig::builder()
        .format(cfg.log_format)
        .verbose(cfg.verbose)
        .quiet(cfg.quiet)
        .log_file(log_file)
        .path_env(env.clone())
        .colored(cfg.colored)
        .timestamps(cfg.timestamps)
        .build();
    let sub = subscriber(sub_cfg).map_err(CheckError::Logging)?;
    with_default(sub, || {
        let setup = setup(env.temp_dir())?;
        run_checks(setup)
    })
}
