// crates/logging/src/formatter.rs
use std::fmt;

use time::{OffsetDateTime, macros::format_description};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, format::Writer};
use tracing_subscriber::registry::LookupSpan;

/// Plain text records: `[timestamp ]LEVEL target: message fields`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LineFormatter {
    timestamps: bool,
}

impl LineFormatter {
    pub fn new(timestamps: bool) -> Self {
        Self { timestamps }
    }
}

fn local_timestamp() -> Result<String, fmt::Error> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(&format_description!(
        "[year]/[month]/[day] [hour]:[minute]:[second]"
    ))
    .map_err(|_| fmt::Error)
}

impl<S, N> FormatEvent<S, N> for LineFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        if self.timestamps {
            write!(writer, "{} ", local_timestamp()?)?;
        }
        let meta = event.metadata();
        write!(writer, "{:>5} {}: ", meta.level().as_str(), meta.target())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
