//! Consecutive-day streaks over a sparse completion log.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Whether an old streak still counts as "current".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakPolicy {
    /// The streak ending at the latest completion is reported no matter how
    /// long ago that was.
    #[default]
    Anchored,
    /// The streak drops to zero once the latest completion is older than
    /// yesterday.
    Recent,
}

impl StreakPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreakPolicy::Anchored => "anchored",
            StreakPolicy::Recent => "recent",
        }
    }
}

/// Sorted (descending), deduplicated copy of `dates`.
fn descending(dates: &[NaiveDate]) -> Vec<NaiveDate> {
    let mut sorted = dates.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();
    sorted
}

/// Streak ending at the most recent completed date.
///
/// `dates` are the days a habit was completed, in any order. Returns 0 for
/// an empty slice, otherwise counts back from the latest date until the
/// first gap.
pub fn compute_streak(dates: &[NaiveDate]) -> u32 {
    let sorted = descending(dates);
    if sorted.is_empty() {
        return 0;
    }

    let mut streak = 1u32;
    for pair in sorted.windows(2) {
        if (pair[0] - pair[1]).num_days() == 1 {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

/// Streak as seen on `today` under `policy`.
pub fn current_streak(dates: &[NaiveDate], today: NaiveDate, policy: StreakPolicy) -> u32 {
    match policy {
        StreakPolicy::Anchored => compute_streak(dates),
        StreakPolicy::Recent => {
            let Some(latest) = dates.iter().max() else {
                return 0;
            };
            if (today - *latest).num_days() > 1 {
                0
            } else {
                compute_streak(dates)
            }
        }
    }
}

/// Longest run of consecutive days anywhere in the log.
pub fn longest_streak(dates: &[NaiveDate]) -> u32 {
    let sorted = descending(dates);
    if sorted.is_empty() {
        return 0;
    }

    let mut longest = 1u32;
    let mut run = 1u32;
    for pair in sorted.windows(2) {
        if (pair[0] - pair[1]).num_days() == 1 {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 1;
        }
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn days(list: &[&str]) -> Vec<NaiveDate> {
        list.iter().map(|s| day(s)).collect()
    }

    #[test]
    fn test_empty_log_has_no_streak() {
        assert_eq!(compute_streak(&[]), 0);
        assert_eq!(longest_streak(&[]), 0);
        assert_eq!(current_streak(&[], day("2024-01-05"), StreakPolicy::Recent), 0);
    }

    #[test]
    fn test_single_completion_is_streak_of_one() {
        assert_eq!(compute_streak(&days(&["2023-06-01"])), 1);
    }

    #[test]
    fn test_three_consecutive_days() {
        let log = days(&["2024-01-05", "2024-01-04", "2024-01-03"]);
        assert_eq!(compute_streak(&log), 3);
    }

    #[test]
    fn test_gap_stops_streak() {
        let log = days(&["2024-01-05", "2024-01-03"]);
        assert_eq!(compute_streak(&log), 1);
    }

    #[test]
    fn test_n_consecutive_days_for_many_lengths() {
        let end = day("2024-03-01");
        for n in 1..=40u32 {
            let log: Vec<NaiveDate> = (0..n)
                .map(|i| end - chrono::Duration::days(i as i64))
                .collect();
            assert_eq!(compute_streak(&log), n, "run of {} days", n);
        }
    }

    #[test]
    fn test_order_and_duplicates_do_not_matter() {
        let log = days(&["2024-01-03", "2024-01-05", "2024-01-04", "2024-01-05"]);
        assert_eq!(compute_streak(&log), 3);
    }

    #[test]
    fn test_streak_crosses_month_and_year() {
        let log = days(&["2024-01-01", "2023-12-31", "2023-12-30"]);
        assert_eq!(compute_streak(&log), 3);

        let leap = days(&["2024-03-01", "2024-02-29", "2024-02-28"]);
        assert_eq!(compute_streak(&leap), 3);
    }

    #[test]
    fn test_anchored_streak_never_expires() {
        let log = days(&["2024-01-05", "2024-01-04"]);
        let much_later = day("2024-06-01");
        assert_eq!(current_streak(&log, much_later, StreakPolicy::Anchored), 2);
    }

    #[test]
    fn test_recent_policy_expires_after_yesterday() {
        let log = days(&["2024-01-05", "2024-01-04"]);
        assert_eq!(current_streak(&log, day("2024-01-05"), StreakPolicy::Recent), 2);
        assert_eq!(current_streak(&log, day("2024-01-06"), StreakPolicy::Recent), 2);
        assert_eq!(current_streak(&log, day("2024-01-07"), StreakPolicy::Recent), 0);
    }

    #[test]
    fn test_longest_streak_finds_older_run() {
        let log = days(&[
            "2024-01-10",
            "2024-01-08",
            "2024-01-07",
            "2024-01-06",
            "2024-01-05",
            "2024-01-01",
        ]);
        assert_eq!(compute_streak(&log), 1);
        assert_eq!(longest_streak(&log), 4);
    }
}
