//! Habit metrics engine
//!
//! Turns completion logs into derived numbers:
//! - [`streak`]: consecutive-day streaks
//! - [`completion`]: trailing seven-day completion rate
//! - [`goals`]: goal progress recomputation
//! - [`progression`]: points, levels and achievement unlocks
//!
//! Every function here is total over valid input. Empty logs and users
//! without habits yield zeros rather than errors. Nothing is updated
//! incrementally: each call recomputes from the full log, so running it
//! twice (or concurrently from two writers) converges on the same state.
//!
//! The engine reads logs only through [`CompletionLogStore`]; the SQLite
//! [`Database`](crate::Database) is one implementation.

pub mod completion;
pub mod goals;
pub mod progression;
pub mod streak;

pub use completion::{completion_window, compute_completion_rate, COMPLETION_WINDOW_DAYS};
pub use goals::recompute_goals;
pub use progression::{
    level_for_points, recompute_user_stats, AchievementRule, AchievementUnlock, ACHIEVEMENT_POINTS,
    ACHIEVEMENT_RULES, POINTS_PER_LEVEL, POINTS_PER_STREAK_DAY, RuleMetric,
};
pub use streak::{compute_streak, current_streak, longest_streak, StreakPolicy};

use chrono::NaiveDate;

use crate::error::Result;

/// Read/write access to completion logs.
pub trait CompletionLogStore {
    /// Dates of completed entries for a habit, most recent first.
    fn list_completed_dates(&self, habit_id: i64) -> Result<Vec<NaiveDate>>;

    /// `(date, completed)` pairs for a habit within `from..=to`, oldest first.
    fn list_logs(&self, habit_id: i64, from: NaiveDate, to: NaiveDate)
        -> Result<Vec<(NaiveDate, bool)>>;

    /// Insert or overwrite the entry for `(habit_id, date)`.
    fn upsert_log(&self, habit_id: i64, date: NaiveDate, completed: bool) -> Result<()>;
}

/// Current streak of a habit as of `today`.
pub fn habit_streak<S: CompletionLogStore + ?Sized>(
    store: &S,
    habit_id: i64,
    today: NaiveDate,
    policy: StreakPolicy,
) -> Result<u32> {
    let dates = store.list_completed_dates(habit_id)?;
    Ok(current_streak(&dates, today, policy))
}

/// Completion rate of a habit over the window ending `today`.
pub fn habit_completion_rate<S: CompletionLogStore + ?Sized>(
    store: &S,
    habit_id: i64,
    today: NaiveDate,
) -> Result<u32> {
    let (from, to) = completion_window(today);
    let logs = store.list_logs(habit_id, from, to)?;
    Ok(compute_completion_rate(&logs))
}
