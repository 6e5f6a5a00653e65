// src/bin/lockcheck.rs

use clap::{ArgAction, Parser};
use lockcheck::{CheckConfig, CheckReport, ExitCode, ReportFormat, check_with_config};
use logging::LogFormat;
use std::path::PathBuf;

/// Check that log files opened below invalid directories fail with the
/// right error.
#[derive(Debug, Parser)]
#[command(name = "lockcheck", version, about)]
struct Cli {
    /// Directory the fixtures are created in [default: temp directory]
    #[arg(long, value_name = "DIR")]
    scratch_dir: Option<PathBuf>,
    /// Increase log verbosity
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
    /// Also write the log to a file; %t is the scratch directory
    #[arg(long, value_name = "PATTERN")]
    log_file: Option<String>,
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_file_format: LogFormat,
    #[arg(long)]
    timestamps: bool,
    #[arg(long)]
    no_color: bool,
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

impl Cli {
    fn into_config(self) -> CheckConfig {
        CheckConfig::builder()
            .scratch_dir(self.scratch_dir)
            .log_format(self.log_format)
            .verbose(self.verbose)
            .quiet(self.quiet)
            .log_file(self.log_file.map(|p| (p, self.log_file_format)))
            .colored(!self.no_color)
            .timestamps(self.timestamps)
            .report(self.report)
            .build()
    }
}

fn print_report(report: &CheckReport, format: ReportFormat) -> Result<(), serde_json::Error> {
    match format {
        ReportFormat::Text => print!("{}", report.render_text()),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

fn main() {
    let cfg = Cli::parse().into_config();
    match check_with_config(&cfg) {
        Ok(report) => {
            if let Err(e) = print_report(&report, cfg.report) {
                eprintln!("lockcheck: failed to render report: {e}");
                std::process::exit(u8::from(ExitCode::CheckFailed) as i32);
            }
        }
        Err(e) => {
            eprintln!("lockcheck: {e}");
            std::process::exit(u8::from(e.exit_code()) as i32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_map_onto_config() {
        let cli = Cli::parse_from([
            "lockcheck",
            "--scratch-dir",
            "/scratch",
            "-vv",
            "--log-file",
            "%t/run.log",
            "--log-file-format",
            "json",
            "--no-color",
            "--report",
            "json",
        ]);
        let cfg = cli.into_config();
        assert_eq!(cfg.scratch_dir, Some(PathBuf::from("/scratch")));
        assert_eq!(cfg.verbose, 2);
        assert_eq!(cfg.log_file, Some(("%t/run.log".to_string(), LogFormat::Json)));
        assert!(!cfg.colored);
        assert_eq!(cfg.report, ReportFormat::Json);
    }
}
