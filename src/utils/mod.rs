//! Timing and formatting helpers shared by the executor, aggregator and reporter.

use chrono::{DateTime, Local, SecondsFormat};
use std::time::Duration;

/// Round to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Duration in seconds at millisecond precision.
pub fn seconds_3dp(d: Duration) -> f64 {
    round_to(d.as_secs_f64(), 3)
}

/// Seconds without a trailing `.0` for whole values (`120`, `0.25`).
pub fn format_secs(d: Duration) -> String {
    format!("{}", d.as_secs_f64())
}

/// ISO-8601 with microseconds and offset.
pub fn iso_timestamp(at: &DateTime<Local>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// `YYYYMMDD_HHMMSS`, for file names.
pub fn file_stamp(at: &DateTime<Local>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

pub fn iso_now() -> String {
    iso_timestamp(&Local::now())
}
