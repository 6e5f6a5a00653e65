// src/probe.rs

use std::path::PathBuf;

use logging::{FileHandler, FileHandlerConfig, HandlerError, Outcome, PathEnv};
use tracing::debug;

/// What happened when a log file was opened from a pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attempt {
    pub pattern: String,
    pub outcome: Outcome,
    /// The log file that was created, on success.
    pub log_path: Option<PathBuf>,
    /// The error message of a classified failure.
    pub detail: Option<String>,
}

/// Open a [`FileHandler`] for `pattern` and classify the result.
///
/// A successful handler is closed again straight away, leaving the log
/// file on disk. Failures that are not one of the precise lock-location
/// kinds are returned as errors.
pub fn attempt_open(pattern: &str, env: &PathEnv) -> Result<Attempt, HandlerError> {
    let cfg = FileHandlerConfig::builder().pattern(pattern).build();
    let attempt = match FileHandler::open(&cfg, env) {
        Ok(mut handler) => {
            let log_path = handler.log_path()?;
            handler.close()?;
            Attempt {
                pattern: pattern.to_string(),
                outcome: Outcome::Success,
                log_path: Some(log_path),
                detail: None,
            }
        }
        Err(err) => match err.outcome() {
            Some(outcome) => Attempt {
                pattern: pattern.to_string(),
                outcome,
                log_path: None,
                detail: Some(err.to_string()),
            },
            None => return Err(err),
        },
    };
    debug!(pattern, outcome = %attempt.outcome, "attempted open");
    Ok(attempt)
}
