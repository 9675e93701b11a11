use chrono::{DateTime, Utc};
use tokio::time::Instant;

pub fn now_i64() -> i64 {
    Utc::now().timestamp()
}

pub fn get_instant() -> Instant {
    Instant::now()
}

/// Seconds elapsed since `since`, as a float.
pub fn seconds_since(since: Instant) -> f64 {
    get_instant().saturating_duration_since(since).as_secs_f64()
}

pub fn format_unix(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}
