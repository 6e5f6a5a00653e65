// crates/logging/src/lib.rs

//! Pattern-based log files with lock-location checks, plus the
//! [`tracing`] subscriber that writes through them.

mod error;
mod flags;
mod formatter;
mod handler;
mod json_format;
mod pattern;
mod sink;
mod subscriber;

pub use error::{HandlerError, Outcome, Result};
pub use flags::{LogFormat, SubscriberConfig, SubscriberConfigBuilder};
pub use formatter::LineFormatter;
pub use handler::{FileHandler, FileHandlerConfig, FileHandlerConfigBuilder, check_lock_location};
pub use json_format::JsonFormatter;
pub use pattern::{LogPattern, PathEnv};
pub use sink::FileWriter;
pub use subscriber::{init, subscriber};
