//! Timestamp and duration utilities

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Convert a nominal duration in seconds to a `Duration`
///
/// Negative, NaN and infinite values are rejected. This is the boundary where
/// durations coming from scripts or callers are checked; everything past it
/// works with `Duration` and cannot be negative.
pub fn seconds_to_duration(seconds: f64) -> Result<Duration> {
    if seconds.is_nan() {
        return Err(Error::InvalidDuration("duration is NaN".to_string()));
    }
    if seconds < 0.0 {
        return Err(Error::InvalidDuration(format!(
            "duration must be non-negative, got {}",
            seconds
        )));
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|e| Error::InvalidDuration(format!("{}: {}", seconds, e)))
}

/// Format a duration as seconds with millisecond precision ("12.345s")
pub fn format_duration(duration: Duration) -> String {
    format!("{}.{:03}s", duration.as_secs(), duration.subsec_millis())
}
