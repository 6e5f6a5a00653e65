// crates/logging/src/subscriber.rs
#![allow(missing_docs)]

use std::io;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, fmt as tracing_fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::error::Result;
use crate::flags::{LogFormat, SubscriberConfig};
use crate::formatter::LineFormatter;
use crate::handler::FileHandler;
use crate::json_format::JsonFormatter;
use crate::sink::FileWriter;

fn default_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::ERROR
    } else if verbose > 2 {
        LevelFilter::TRACE
    } else if verbose > 1 {
        LevelFilter::DEBUG
    } else if verbose > 0 {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    }
}

/// Build a [`tracing`] subscriber logging to stderr and, optionally, to a
/// pattern-based log file.
///
/// Opening the log file is the only fallible step. Its error keeps the
/// precise [`crate::HandlerError`] kind so callers can report why the log
/// location was rejected.
pub fn subscriber(cfg: SubscriberConfig) -> Result<Box<dyn tracing::Subscriber + Send + Sync>> {
    let SubscriberConfig {
        format,
        verbose,
        quiet,
        log_file,
        path_env,
        colored,
        timestamps,
    } = cfg;

    let filter = EnvFilter::builder()
        .with_default_directive(default_level(verbose, quiet).into())
        .from_env_lossy();

    let base = tracing_fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(colored);
    let fmt_layer = match format {
        LogFormat::Json => base.event_format(JsonFormatter::new(timestamps)).boxed(),
        LogFormat::Text => base.event_format(LineFormatter::new(timestamps)).boxed(),
    };

    let file_layer = if let Some((handler_cfg, fmt)) = log_file {
        let handler = FileHandler::open(&handler_cfg, &path_env)?;
        let base = tracing_fmt::layer()
            .with_writer(FileWriter::new(handler))
            .with_ansi(false);
        let layer = match fmt {
            LogFormat::Json => base.event_format(JsonFormatter::new(timestamps)).boxed(),
            LogFormat::Text => base.event_format(LineFormatter::new(timestamps)).boxed(),
        };
        Some(layer)
    } else {
        None
    };

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(file_layer);
    Ok(Box::new(registry))
}

/// Initialise the global [`tracing`] subscriber.
pub fn init(cfg: SubscriberConfig) -> Result<()> {
    subscriber(cfg)?.init();
    Ok(())
}
