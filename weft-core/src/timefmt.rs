//! Display formatting for times and durations.

use crate::Timestamp;
use chrono::Duration;

/// Coarse "time ago" rendering used in tables and previews.
pub fn format_relative_time(now: Timestamp, t: Timestamp) -> String {
    let elapsed = now - t;
    if elapsed < Duration::zero() {
        return format_in(-elapsed);
    }
    if elapsed < Duration::minutes(1) {
        return "just now".to_string();
    }
    if elapsed < Duration::hours(1) {
        return format!("{}m ago", elapsed.num_minutes());
    }
    if elapsed < Duration::hours(24) {
        return format!("{}h ago", elapsed.num_hours());
    }
    format!("{}d ago", elapsed.num_hours() / 24)
}

fn format_in(until: Duration) -> String {
    if until < Duration::minutes(1) {
        "in <1m".to_string()
    } else if until < Duration::hours(1) {
        format!("in {}m", until.num_minutes())
    } else if until < Duration::hours(24) {
        format!("in {}h", until.num_hours())
    } else {
        format!("in {}d", until.num_hours() / 24)
    }
}

/// Compact duration rendering, second precision.
pub fn format_duration(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    if secs < 60 {
        return format!("{secs}s");
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{}m{}s", mins, secs % 60);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h{}m", hours, mins % 60);
    }
    format!("{}d{}h", hours / 24, hours % 24)
}

/// Truncates to `max_len`, appending an ellipsis when anything was cut.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let cut: String = s.chars().take(keep).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn relative_time_buckets() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(format_relative_time(now, now - Duration::seconds(30)), "just now");
        assert_eq!(format_relative_time(now, now - Duration::minutes(5)), "5m ago");
        assert_eq!(format_relative_time(now, now - Duration::hours(3)), "3h ago");
        assert_eq!(format_relative_time(now, now - Duration::days(2)), "2d ago");
    }

    #[test]
    fn relative_time_future() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(format_relative_time(now, now + Duration::minutes(5)), "in 5m");
        assert_eq!(format_relative_time(now, now + Duration::hours(2)), "in 2h");
    }

    #[test]
    fn duration_rendering() {
        assert_eq!(format_duration(Duration::seconds(42)), "42s");
        assert_eq!(format_duration(Duration::seconds(95)), "1m35s");
        assert_eq!(format_duration(Duration::minutes(150)), "2h30m");
        assert_eq!(format_duration(Duration::hours(50)), "2d2h");
    }

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate("order-1", 25), "order-1");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
    }
}
