//! Dashboard and history views.
//!
//! Plain data assembled by [`crate::Tracker`] from engine outputs. Nothing
//! here touches the store; the aggregate numbers are computed from the
//! per-habit summaries so the view can never disagree with its rows.

use chrono::NaiveDate;
use serde::Serialize;

use crate::metrics::COMPLETION_WINDOW_DAYS;
use crate::types::{Achievement, Habit, Insight, UserStats};

/// Number of achievements shown on the dashboard.
pub const DASHBOARD_ACHIEVEMENTS: usize = 5;
/// Number of insights shown on the dashboard.
pub const DASHBOARD_INSIGHTS: usize = 4;

/// One active habit as shown on the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct HabitSummary {
    pub habit: Habit,
    /// Current streak under the configured policy
    pub streak: u32,
    /// Longest run anywhere in the log
    pub longest_streak: u32,
    /// Trailing seven-day completion rate (0-100)
    pub completion_rate: u32,
    pub completed_today: bool,
    /// Completion flags for the window, index 0 = oldest, last = today
    pub week: [bool; COMPLETION_WINDOW_DAYS as usize],
}

/// Everything the dashboard shows for one user on one day.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub date: NaiveDate,
    pub habits: Vec<HabitSummary>,
    /// Active habits completed on `date`
    pub completed_today: usize,
    /// Best current streak among active habits
    pub longest_current_streak: u32,
    /// Floor of the mean completion rate, 0 without habits
    pub average_completion_rate: u32,
    pub stats: UserStats,
    pub recent_achievements: Vec<Achievement>,
    pub recent_insights: Vec<Insight>,
}

impl Dashboard {
    /// Build the dashboard, deriving the aggregates from `habits`.
    pub fn new(
        date: NaiveDate,
        habits: Vec<HabitSummary>,
        stats: UserStats,
        recent_achievements: Vec<Achievement>,
        recent_insights: Vec<Insight>,
    ) -> Self {
        let completed_today = habits.iter().filter(|h| h.completed_today).count();
        let longest_current_streak = habits.iter().map(|h| h.streak).max().unwrap_or(0);
        let average_completion_rate = if habits.is_empty() {
            0
        } else {
            habits.iter().map(|h| h.completion_rate).sum::<u32>() / habits.len() as u32
        };

        Self {
            date,
            habits,
            completed_today,
            longest_current_streak,
            average_completion_rate,
            stats,
            recent_achievements,
            recent_insights,
        }
    }

    /// Total active habits.
    pub fn total_habits(&self) -> usize {
        self.habits.len()
    }

    /// "3/5" style completion count for today.
    pub fn format_today(&self) -> String {
        format!("{}/{}", self.completed_today, self.total_habits())
    }

    /// Level line, e.g. "Level 2 (140 pts, 40% to next)".
    pub fn format_level(&self) -> String {
        format!(
            "Level {} ({} pts, {}% to next)",
            self.stats.level,
            self.stats.total_points,
            self.stats.progress_to_next_level()
        )
    }
}

impl HabitSummary {
    /// Seven-day strip, oldest first, e.g. "■■□■■■■".
    pub fn format_week(&self) -> String {
        self.week
            .iter()
            .map(|&done| if done { '■' } else { '□' })
            .collect()
    }
}

/// One logged day in a habit's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryDay {
    pub date: NaiveDate,
    pub completed: bool,
}

/// A habit's full log, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct HabitHistory {
    pub habit_id: i64,
    pub name: String,
    pub category: String,
    pub days: Vec<HistoryDay>,
}

impl HabitHistory {
    /// Number of completed days in the log.
    pub fn completed_count(&self) -> usize {
        self.days.iter().filter(|d| d.completed).count()
    }

    /// First and last logged day, if any.
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.days.first()?.date, self.days.last()?.date))
    }
}
