// crates/logging/src/json_format.rs

use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{Event, Subscriber};
use tracing_serde::{AsSerde, fields::AsMap};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, format::Writer};
use tracing_subscriber::registry::LookupSpan;

/// One JSON object per record, with the event message lifted out of the
/// field map.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonFormatter {
    timestamps: bool,
}

impl JsonFormatter {
    pub fn new(timestamps: bool) -> Self {
        Self { timestamps }
    }
}

impl<S, N> FormatEvent<S, N> for JsonFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut obj = Map::new();
        if self.timestamps {
            let timestamp = OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .map_err(|_| std::fmt::Error)?;
            obj.insert("timestamp".into(), Value::String(timestamp));
        }
        obj.insert(
            "level".into(),
            serde_json::to_value(event.metadata().level().as_serde())
                .map_err(|_| std::fmt::Error)?,
        );
        obj.insert(
            "target".into(),
            Value::String(event.metadata().target().to_string()),
        );
        let mut fields = match serde_json::to_value(event.field_map()) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) | Err(_) => return Err(std::fmt::Error),
        };
        if let Some(message) = fields.remove("message") {
            obj.insert("message".into(), message);
        }
        obj.insert("fields".into(), Value::Object(fields));
        let data = serde_json::to_string(&Value::Object(obj)).map_err(|_| std::fmt::Error)?;
        writer.write_str(&data)?;
        writer.write_char('\n')
    }
}
