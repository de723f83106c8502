//! TUI Widgets - formatting helpers shared by the views
//!
//! Views are rendered inline in `app.rs`; these are the pure pieces.

/// Common widget utilities
pub mod utils {
    use std::time::Duration;

    use chrono::{DateTime, Utc};

    /// Compact run duration, e.g. "1m 35s" or "2h 05m"
    pub fn format_duration(duration: Duration) -> String {
        let secs = duration.as_secs();
        if secs >= 3600 {
            format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60)
        } else if secs >= 60 {
            format!("{}m {:02}s", secs / 60, secs % 60)
        } else {
            format!("{}s", secs)
        }
    }

    /// Relative age, e.g. "5m ago"
    pub fn format_age(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
        let secs = (now - at).num_seconds().max(0);
        match secs {
            s if s < 60 => "just now".to_string(),
            s if s < 3600 => format!("{}m ago", s / 60),
            s if s < 86_400 => format!("{}h ago", s / 3600),
            s => format!("{}d ago", s / 86_400),
        }
    }

    /// Truncate to `max` characters, marking the cut with an ellipsis
    pub fn truncate(text: &str, max: usize) -> String {
        if text.chars().count() <= max {
            return text.to_string();
        }
        let kept: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::utils::*;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(0)), "0s");
        assert_eq!(format_duration(Duration::from_secs(95)), "1m 35s");
        assert_eq!(format_duration(Duration::from_secs(7500)), "2h 05m");
    }

    #[test]
    fn test_format_age() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(format_age(now, now), "just now");
        assert_eq!(format_age(now - chrono::Duration::minutes(5), now), "5m ago");
        assert_eq!(format_age(now - chrono::Duration::hours(3), now), "3h ago");
        assert_eq!(format_age(now - chrono::Duration::days(2), now), "2d ago");
        // clock skew
        assert_eq!(format_age(now + chrono::Duration::minutes(1), now), "just now");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-long-branch-name", 8), "a-long-…");
    }
}
