use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, Utc};

/// Filesystem-safe capture time, e.g. `20250114_083000`.
pub const COMPACT_FORMAT: &str = "%Y%m%d_%H%M%S";

pub fn utc_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub fn compact(ts: &DateTime<Utc>) -> String {
    ts.format(COMPACT_FORMAT).to_string()
}

/// RFC 3339 with microseconds and a `Z` suffix.
pub fn iso_utc(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn format_uptime(since: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let secs = (*now - *since).num_seconds().max(0);
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}
