// src/check.rs

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use logging::{HandlerError, Outcome, PathEnv};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::cleanup::{CleanupError, remove_tree};
use crate::fixture::{Fixture, FixtureKind, PermissionCheck, Setup, SetupError};
use crate::probe::attempt_open;

/// Process exit codes used by the `lockcheck` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Ok = 0,
    CheckFailed = 1,
    Setup = 3,
    Cleanup = 4,
    Logging = 5,
}

impl From<ExitCode> for u8 {
    fn from(code: ExitCode) -> Self {
        code as u8
    }
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error("check {fixture} failed: expected {expected}, got {actual}: {detail}")]
    Mismatch {
        fixture: FixtureKind,
        expected: Outcome,
        actual: Outcome,
        detail: String,
    },
    #[error("check {fixture} failed: expected {expected}, got unclassified error: {source}")]
    Unclassified {
        fixture: FixtureKind,
        expected: Outcome,
        #[source]
        source: HandlerError,
    },
    #[error("check {fixture} failed: {reason}")]
    Postcondition { fixture: FixtureKind, reason: String },
    #[error(transparent)]
    Cleanup(#[from] CleanupError),
    #[error("unable to open log file: {0}")]
    Logging(#[source] HandlerError),
}

impl CheckError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CheckError::Setup(_) => ExitCode::Setup,
            CheckError::Cleanup(_) => ExitCode::Cleanup,
            CheckError::Logging(_) => ExitCode::Logging,
            CheckError::Mismatch { .. }
            | CheckError::Unclassified { .. }
            | CheckError::Postcondition { .. } => ExitCode::CheckFailed,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckStatus {
    Passed,
    Skipped,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckRecord {
    pub fixture: FixtureKind,
    pub pattern: String,
    pub expected: Outcome,
    pub actual: Option<Outcome>,
    pub status: CheckStatus,
    pub detail: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub platform: &'static str,
    pub scratch: PathBuf,
    pub checks: Vec<CheckRecord>,
}

impl CheckReport {
    pub fn passed(&self) -> usize {
        self.count(CheckStatus::Passed)
    }

    pub fn skipped(&self) -> usize {
        self.count(CheckStatus::Skipped)
    }

    fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "scratch {} ({})",
            self.scratch.display(),
            self.platform
        );
        for check in &self.checks {
            let status = match check.status {
                CheckStatus::Passed => "passed",
                CheckStatus::Skipped => "skipped",
            };
            let _ = write!(
                out,
                "  {:<18}{:<19}{status}",
                check.fixture.name(),
                check.expected.as_str()
            );
            if let (CheckStatus::Skipped, Some(detail)) = (check.status, &check.detail) {
                let _ = write!(out, " ({detail})");
            }
            out.push('\n');
        }
        let _ = writeln!(
            out,
            "{} checks: {} passed, {} skipped",
            self.checks.len(),
            self.passed(),
            self.skipped()
        );
        out
    }
}

/// Attempt to open `log.log` inside `fixture` and compare the outcome with
/// the one expected for its kind.
fn check_fixture(fixture: &Fixture, env: &PathEnv) -> Result<CheckRecord, CheckError> {
    let pattern = fixture.log_pattern();
    let expected = fixture.kind.expected();
    let attempt = attempt_open(&pattern, env).map_err(|source| CheckError::Unclassified {
        fixture: fixture.kind,
        expected,
        source,
    })?;
    if attempt.outcome != expected {
        let detail = match (&attempt.detail, &attempt.log_path) {
            (Some(detail), _) => detail.clone(),
            (None, Some(path)) => format!("opened {}", path.display()),
            (None, None) => String::new(),
        };
        return Err(CheckError::Mismatch {
            fixture: fixture.kind,
            expected,
            actual: attempt.outcome,
            detail,
        });
    }
    match fixture.kind {
        FixtureKind::WritableDir => match &attempt.log_path {
            Some(path) if path.is_file() => {}
            Some(path) => {
                return Err(CheckError::Postcondition {
                    fixture: fixture.kind,
                    reason: format!("log file {} was not created", path.display()),
                });
            }
            None => {
                return Err(CheckError::Postcondition {
                    fixture: fixture.kind,
                    reason: "no log file reported".to_string(),
                });
            }
        },
        FixtureKind::NonDirectoryFile => {
            let detail = attempt.detail.as_deref().unwrap_or_default();
            if !detail.contains("not a directory") {
                return Err(CheckError::Postcondition {
                    fixture: fixture.kind,
                    reason: format!("error message does not say \"not a directory\": {detail}"),
                });
            }
        }
        FixtureKind::NonWritableDir | FixtureKind::AbsentPath => {}
    }
    info!(fixture = fixture.name, outcome = %attempt.outcome, "check passed");
    Ok(CheckRecord {
        fixture: fixture.kind,
        pattern,
        expected,
        actual: Some(attempt.outcome),
        status: CheckStatus::Passed,
        detail: attempt.detail,
    })
}

fn check_writable(setup: &Setup, env: &PathEnv) -> Result<CheckRecord, CheckError> {
    let fixture = setup.writable_dir();
    let result = check_fixture(fixture, env);
    let removed = remove_tree(&fixture.path);
    let record = match (result, removed) {
        (Err(e), Err(cleanup)) => {
            warn!("{cleanup}");
            return Err(e);
        }
        (result, removed) => {
            removed?;
            result?
        }
    };
    if fs::symlink_metadata(&fixture.path).is_ok() {
        return Err(CheckError::Postcondition {
            fixture: fixture.kind,
            reason: format!("{} still exists after deletion", fixture.path.display()),
        });
    }
    Ok(record)
}

fn skipped(fixture: &Fixture, reason: &str) -> CheckRecord {
    warn!(fixture = fixture.name, "skipping check: {reason}");
    CheckRecord {
        fixture: fixture.kind,
        pattern: fixture.log_pattern(),
        expected: fixture.kind.expected(),
        actual: None,
        status: CheckStatus::Skipped,
        detail: Some(reason.to_string()),
    }
}

/// Run the four lock-location checks in order, stopping at the first
/// failure, then run the deferred cleanup.
///
/// `%t` in every pattern resolves to the scratch directory of `setup`.
pub fn run_checks(setup: Setup) -> Result<CheckReport, CheckError> {
    let env = PathEnv::with_temp_dir(setup.scratch());
    let mut checks = Vec::with_capacity(FixtureKind::ALL.len());

    checks.push(check_writable(&setup, &env)?);

    let non_writable = setup.fixture(FixtureKind::NonWritableDir);
    match setup.permission_check() {
        PermissionCheck::Supported => checks.push(check_fixture(non_writable, &env)?),
        PermissionCheck::Unsupported { reason } => checks.push(skipped(non_writable, reason)),
    }

    checks.push(check_fixture(setup.fixture(FixtureKind::NonDirectoryFile), &env)?);

    let absent = setup.fixture(FixtureKind::AbsentPath);
    if fs::symlink_metadata(&absent.path).is_ok() {
        return Err(CheckError::Postcondition {
            fixture: absent.kind,
            reason: format!("{} exists before the attempt", absent.path.display()),
        });
    }
    checks.push(check_fixture(absent, &env)?);

    let report = CheckReport {
        platform: std::env::consts::OS,
        scratch: setup.scratch().to_path_buf(),
        checks,
    };
    setup.finish()?;
    Ok(report)
}
