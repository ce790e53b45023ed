use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

const SECONDS_PER_DAY: u64 = 86_400;

/// Return the current unix timestamp in seconds.
pub fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}

/// Unix timestamp of the most recent UTC midnight at or before `now`.
pub fn start_of_utc_day(now: u64) -> u64 {
    now - now % SECONDS_PER_DAY
}

/// Whole days between two timestamps, counting a started day as a full one.
pub fn days_between(earlier: u64, later: u64) -> u64 {
    later.abs_diff(earlier).div_ceil(SECONDS_PER_DAY)
}

/// Render a unix timestamp as `YYYY-MM-DD` (UTC).
pub fn format_unix_date(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_owned())
}

/// Filesystem-safe timestamp used in backup file names.
pub fn file_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H-%M-%S").to_string()
}
