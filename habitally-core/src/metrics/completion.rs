//! Weekly completion rate.

use chrono::{Duration, NaiveDate};

/// Length of the trailing window, today included.
pub const COMPLETION_WINDOW_DAYS: i64 = 7;

/// Inclusive `(from, to)` bounds of the window ending on `today`.
pub fn completion_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(COMPLETION_WINDOW_DAYS - 1), today)
}

/// Percentage of logged days marked completed, rounded down.
///
/// `logs` are the `(date, completed)` entries inside the window. Days with
/// no entry are not counted. No entries at all gives 0.
pub fn compute_completion_rate(logs: &[(NaiveDate, bool)]) -> u32 {
    if logs.is_empty() {
        return 0;
    }
    let completed = logs.iter().filter(|(_, done)| *done).count();
    (completed * 100 / logs.len()) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_window_is_seven_days_inclusive() {
        let (from, to) = completion_window(day("2024-01-10"));
        assert_eq!(from, day("2024-01-04"));
        assert_eq!(to, day("2024-01-10"));
        assert_eq!((to - from).num_days() + 1, COMPLETION_WINDOW_DAYS);
    }

    #[test]
    fn test_no_logs_is_zero() {
        assert_eq!(compute_completion_rate(&[]), 0);
    }

    #[test]
    fn test_rate_rounds_down() {
        let logs = vec![
            (day("2024-01-08"), true),
            (day("2024-01-09"), false),
            (day("2024-01-10"), true),
        ];
        assert_eq!(compute_completion_rate(&logs), 66);
    }

    #[test]
    fn test_rate_bounds() {
        let all_done: Vec<_> = (1..=7)
            .map(|d| (NaiveDate::from_ymd_opt(2024, 1, d).unwrap(), true))
            .collect();
        assert_eq!(compute_completion_rate(&all_done), 100);

        let none_done: Vec<_> = (1..=7)
            .map(|d| (NaiveDate::from_ymd_opt(2024, 1, d).unwrap(), false))
            .collect();
        assert_eq!(compute_completion_rate(&none_done), 0);

        for done in 0..=7usize {
            let logs: Vec<_> = (0..7usize)
                .map(|i| (NaiveDate::from_ymd_opt(2024, 1, i as u32 + 1).unwrap(), i < done))
                .collect();
            let rate = compute_completion_rate(&logs);
            assert!(rate <= 100, "rate {} out of range", rate);
        }
    }
}
