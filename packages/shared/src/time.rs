//! Time-related utilities with clock abstraction for testability.
//!
//! The reference deployment formats chat timestamps in IST (Asia/Kolkata,
//! UTC+5:30), so the helpers here work in that offset.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone, Utc};

/// IST offset from UTC in seconds (UTC+5:30)
const IST_OFFSET_SECS: i32 = 5 * 3600 + 1800;

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get current Unix timestamp in IST (milliseconds)
    fn now_ist_millis(&self) -> i64;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ist_millis(&self) -> i64 {
        get_ist_timestamp()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: i64,
}

impl FixedClock {
    /// Create a new fixed clock with the given timestamp
    pub fn new(fixed_time_millis: i64) -> Self {
        Self {
            fixed_time: fixed_time_millis,
        }
    }
}

impl Clock for FixedClock {
    fn now_ist_millis(&self) -> i64 {
        self.fixed_time
    }
}

fn ist_offset() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).expect("IST offset is a valid fixed offset")
}

/// Get current Unix timestamp in IST (milliseconds)
pub fn get_ist_timestamp() -> i64 {
    let now_utc = Utc::now();
    let now_ist: DateTime<FixedOffset> = now_utc.with_timezone(&ist_offset());
    now_ist.timestamp_millis()
}

/// Convert Unix timestamp (milliseconds) to IST RFC 3339 format
pub fn timestamp_to_ist_rfc3339(timestamp_millis: i64) -> String {
    let seconds = timestamp_millis / 1000;
    let nanos = ((timestamp_millis % 1000) * 1_000_000) as u32;
    let dt = ist_offset()
        .timestamp_opt(seconds, nanos)
        .single()
        .unwrap_or_else(|| ist_offset().timestamp_opt(0, 0).unwrap());
    dt.to_rfc3339()
}

/// Format a Unix timestamp (milliseconds) as IST wall-clock time "HH:MM:SS"
///
/// This is the format the chat relay stamps on room messages.
pub fn timestamp_to_ist_hms(timestamp_millis: i64) -> String {
    let seconds = timestamp_millis / 1000;
    let dt = ist_offset()
        .timestamp_opt(seconds, 0)
        .single()
        .unwrap_or_else(|| ist_offset().timestamp_opt(0, 0).unwrap());
    dt.format("%H:%M:%S").to_string()
}

/// Format a Unix timestamp (milliseconds) as a UTC ISO 8601 string with
/// millisecond precision (e.g. "2023-01-01T00:00:00.000Z")
///
/// Meeting chat and private-room notices use this format.
pub fn timestamp_to_iso8601(timestamp_millis: i64) -> String {
    let seconds = timestamp_millis / 1000;
    let nanos = ((timestamp_millis % 1000) * 1_000_000) as u32;
    let dt = Utc
        .timestamp_opt(seconds, nanos)
        .single()
        .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap());
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
