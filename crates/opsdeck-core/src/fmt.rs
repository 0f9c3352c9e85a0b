//! Human-readable byte, age and duration formatting helpers.

use chrono::{DateTime, Utc};

/// Format bytes into a compact human-readable string (e.g., "245M", "1.2G").
#[allow(clippy::as_conversions, clippy::cast_precision_loss)]
pub fn fmt_bytes_short(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1}G", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{}M", bytes / 1_000_000)
    } else if bytes >= 1_000 {
        format!("{}K", bytes / 1_000)
    } else {
        format!("{bytes}B")
    }
}

/// Format seconds into a compact human duration (e.g., "47d 3h", "4h 23m", "12m").
pub fn fmt_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Relative age of `then` as seen from `now` ("just now", "5m ago", "3d ago").
///
/// Timestamps in the future (clock skew between us and the service) read
/// as "just now".
pub fn fmt_age(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    if secs < 60 {
        "just now".into()
    } else if secs < 3_600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3_600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}

/// `fmt_age` for optional timestamps.
pub fn fmt_age_opt(now: DateTime<Utc>, then: Option<DateTime<Utc>>) -> String {
    then.map_or_else(|| "-".into(), |t| fmt_age(now, t))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn bytes_short_scales() {
        assert_eq!(fmt_bytes_short(512), "512B");
        assert_eq!(fmt_bytes_short(2_048), "2K");
        assert_eq!(fmt_bytes_short(245_000_000), "245M");
        assert_eq!(fmt_bytes_short(1_200_000_000), "1.2G");
    }

    #[test]
    fn uptime_picks_two_largest_units() {
        assert_eq!(fmt_uptime(12 * 60), "12m");
        assert_eq!(fmt_uptime(4 * 3600 + 23 * 60), "4h 23m");
        assert_eq!(fmt_uptime(47 * 86400 + 3 * 3600), "47d 3h");
    }

    #[test]
    fn age_buckets() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        assert_eq!(fmt_age(now, now), "just now");
        assert_eq!(fmt_age(now, now - chrono::Duration::minutes(5)), "5m ago");
        assert_eq!(fmt_age(now, now - chrono::Duration::hours(3)), "3h ago");
        assert_eq!(fmt_age(now, now - chrono::Duration::days(2)), "2d ago");
        assert_eq!(fmt_age(now, now + chrono::Duration::minutes(5)), "just now");
        assert_eq!(fmt_age_opt(now, None), "-");
    }
}
