use chrono::{DateTime, Datelike, Utc};

pub const MILLIS_PER_DAY: i64 = 24 * 3600 * 1000;

/// Current time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Start of a lookback window of `days` ending at `now` (ms)
pub fn days_before(now: i64, days: i64) -> i64 {
    now.saturating_sub(days.saturating_mul(MILLIS_PER_DAY))
}

/// Format a millisecond timestamp for listings
///
/// Relative for <7 days ("2h ago", "3d ago"), absolute otherwise ("Jan 15",
/// "Dec 3, 2024"). Out-of-range values print as the raw number.
pub fn format_timestamp(millis: i64) -> String {
    match DateTime::from_timestamp_millis(millis) {
        Some(timestamp) => format_relative_to(&timestamp, &Utc::now()),
        None => millis.to_string(),
    }
}

fn format_relative_to(timestamp: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(*timestamp);

    if duration.num_seconds() < 0 {
        return timestamp.format("%b %-d, %Y %H:%M").to_string();
    }

    if duration.num_days() < 7 {
        let minutes = duration.num_minutes();
        let hours = duration.num_hours();
        let days = duration.num_days();

        if days > 0 {
            format!("{}d ago", days)
        } else if hours > 0 {
            format!("{}h ago", hours)
        } else if minutes > 0 {
            format!("{}m ago", minutes)
        } else {
            "just now".to_string()
        }
    } else if timestamp.year() == now.year() {
        timestamp.format("%b %-d").to_string()
    } else {
        timestamp.format("%b %-d, %Y").to_string()
    }
}
