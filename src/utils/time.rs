use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDateTime, SubsecRound};

/// This is the standard way of converting a timestamp to a string in the activities file.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats accepted when reading timestamps back. Hand-edited files sometimes carry a `T`
/// separator or fractional seconds.
const ACCEPTED_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a stored timestamp. The result is always truncated to whole seconds.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    ACCEPTED_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|v| v.trunc_subsecs(0))
        .ok_or_else(|| anyhow!("Can't parse {value:?} as a timestamp"))
}

/// Durations are persisted as a number of seconds.
pub fn duration_to_seconds(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 1000.
}

pub fn format_duration(v: Duration) -> String {
    if v.num_hours() > 0 {
        format!(
            "{}h{}m{}s",
            v.num_hours(),
            v.num_minutes() % 60,
            v.num_seconds() % 60
        )
    } else if v.num_minutes() > 0 {
        format!("{}m{}s", v.num_minutes() % 60, v.num_seconds() % 60)
    } else {
        format!("{}s", v.num_seconds() % 60)
    }
}
