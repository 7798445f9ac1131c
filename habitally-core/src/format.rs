//! Formatting helpers shared by the presentation layer.

use chrono::{DateTime, NaiveDate, Utc};

/// Format a timestamp relative to `now` (e.g., "2h ago").
pub fn format_relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(ts);

    if duration.num_seconds() < 60 {
        "just now".to_string()
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        ts.format("%b %d").to_string()
    }
}

/// Streak with its unit, e.g. "1 day", "5 days".
pub fn format_streak(days: u32) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{} days", days)
    }
}

/// Text progress bar of `width` cells for a 0-100 percentage.
pub fn format_progress_bar(percent: u32, width: usize) -> String {
    let filled = (percent.min(100) as usize * width) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Due date relative to `today`, e.g. "due in 3 days", "overdue by 1 day".
pub fn format_due(target: NaiveDate, today: NaiveDate) -> String {
    let days = (target - today).num_days();
    match days {
        0 => "due today".to_string(),
        1 => "due tomorrow".to_string(),
        d if d > 1 => format!("due in {} days", d),
        -1 => "overdue by 1 day".to_string(),
        d => format!("overdue by {} days", -d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_relative_time() {
        let now = Utc::now();
        assert_eq!(format_relative_time(now, now), "just now");
        assert_eq!(format_relative_time(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_relative_time(now - Duration::hours(3), now), "3h ago");
        assert_eq!(format_relative_time(now - Duration::days(2), now), "2d ago");
        // Clock skew reads as "just now"
        assert_eq!(format_relative_time(now + Duration::minutes(5), now), "just now");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(format_progress_bar(0, 10), "[----------]");
        assert_eq!(format_progress_bar(40, 10), "[####------]");
        assert_eq!(format_progress_bar(250, 4), "[####]");
    }

    #[test]
    fn test_due() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(format_due(today, today), "due today");
        assert_eq!(format_due(today + Duration::days(3), today), "due in 3 days");
        assert_eq!(format_due(today - Duration::days(1), today), "overdue by 1 day");
    }

    #[test]
    fn test_streak_units() {
        assert_eq!(format_streak(1), "1 day");
        assert_eq!(format_streak(0), "0 days");
    }
}
