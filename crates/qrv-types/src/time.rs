use chrono::{DateTime, Local, SecondsFormat, Timelike, Utc};

use crate::error::TypeError;

/// Current time truncated to millisecond precision, the precision the
/// persisted form carries. Using this at creation keeps in-memory and
/// reloaded timestamps identical.
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    now.with_nanosecond(now.timestamp_subsec_millis() * 1_000_000)
        .unwrap_or(now)
}

/// Parse a persisted timestamp (RFC 3339).
pub fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, TypeError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| TypeError::InvalidTimestamp(value.to_string()))
}

/// Serialize a timestamp for persistence: RFC 3339 with millisecond
/// precision and a `Z` suffix.
pub fn to_rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render a timestamp as local wall-clock time, `YYYY-MM-DD HH:MM:SS (+HH:MM)`.
pub fn format_local(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S (%:z)")
        .to_string()
}
