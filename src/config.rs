// src/config.rs

use clap::ValueEnum;
use logging::LogFormat;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum, Default)]
#[clap(rename_all = "kebab-case")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Configuration for a check run.
#[derive(Clone, Debug)]
pub struct CheckConfig {
    /// Where the fixtures are created. `None` means the platform temp
    /// directory, or the home directory when there is none.
    pub scratch_dir: Option<PathBuf>,
    pub log_format: LogFormat,
    pub verbose: u8,
    pub quiet: bool,
    /// Pattern and format of the run's own log file.
    pub log_file: Option<(String, LogFormat)>,
    pub colored: bool,
    pub timestamps: bool,
    pub report: ReportFormat,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            scratch_dir: None,
            log_format: LogFormat::Text,
            verbose: 0,
            quiet: false,
            log_file: None,
            colored: true,
            timestamps: false,
            report: ReportFormat::Text,
        }
    }
}

impl CheckConfig {
    /// Create a new builder for [`CheckConfig`].
    pub fn builder() -> CheckConfigBuilder {
        CheckConfigBuilder::default()
    }
}

/// Builder for [`CheckConfig`].
#[derive(Debug, Default)]
#[must_use]
pub struct CheckConfigBuilder {
    cfg: CheckConfig,
}

impl CheckConfigBuilder {
    pub fn scratch_dir(mut self, scratch_dir: Option<PathBuf>) -> Self {
        self.cfg.scratch_dir = scratch_dir;
        self
    }

    pub fn log_format(mut self, log_format: LogFormat) -> Self {
        self.cfg.log_format = log_format;
        self
    }

    pub fn verbose(mut self, verbose: u8) -> Self {
        self.cfg.verbose = verbose;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.cfg.quiet = quiet;
        self
    }

    pub fn log_file(mut self, log_file: Option<(String, LogFormat)>) -> Self {
        self.cfg.log_file = log_file;
        self
    }

    pub fn colored(mut self, colored: bool) -> Self {
        self.cfg.colored = colored;
        self
    }

    pub fn timestamps(mut self, timestamps: bool) -> Self {
        self.cfg.timestamps = timestamps;
        self
    }

    pub fn report(mut self, report: ReportFormat) -> Self {
        self.cfg.report = report;
        self
    }

    pub fn build(self) -> CheckConfig {
        self.cfg
    }
}
