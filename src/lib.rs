// src/lib.rs

//! Fixture-driven checks that a pattern-based log file handler reports
//! precise errors when the directory of its lock file is invalid.
//!
//! Four fixtures are created in a scratch directory: a writable
//! directory, a directory without write permission, a plain file standing
//! in for a directory and a path that does not exist. A log file is then
//! opened below each one and the outcome compared with the expected
//! classification.
//!
//! # Examples
//!
//! ```
//! use lockcheck::{CheckStatus, run_checks, setup};
//! # use tempfile::tempdir;
//! # let dir = tempdir().unwrap();
//! let fixtures = setup(dir.path()).unwrap();
//! let report = run_checks(fixtures).unwrap();
//! assert_eq!(report.checks.len(), 4);
//! assert!(report.checks.iter().any(|c| c.status == CheckStatus::Passed));
//! ```

pub mod check;
pub mod cleanup;
pub mod config;
pub mod fixture;
pub mod probe;
pub mod run;

pub use check::{CheckError, CheckRecord, CheckReport, CheckStatus, ExitCode, run_checks};
pub use cleanup::{CleanupError, ExitCleanup, remove_tree};
pub use config::{CheckConfig, CheckConfigBuilder, ReportFormat};
pub use fixture::{Fixture, FixtureKind, PermissionCheck, Setup, SetupError, setup};
pub use logging::Outcome;
pub use probe::{Attempt, attempt_open};
pub use run::check_with_config;
