//! Goal progress recomputation.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::types::Goal;

/// Recompute `current`/`achieved` for every open goal of one habit.
///
/// `current` becomes the number of completed days on or after the goal's
/// creation day. A goal whose count reaches its target is marked achieved
/// and its `current` is clamped to the target. Achieved goals are never
/// reopened.
///
/// Returns only the goals whose progress changed, ready to be persisted.
/// Calling this again on the same log returns nothing.
pub fn recompute_goals(goals: &[Goal], completed_dates: &[NaiveDate]) -> Vec<Goal> {
    let days: BTreeSet<NaiveDate> = completed_dates.iter().copied().collect();

    goals
        .iter()
        .filter(|goal| !goal.achieved)
        .filter_map(|goal| {
            let since = goal.created_at.date_naive();
            let count = days.range(since..).count() as u32;

            let mut updated = goal.clone();
            updated.current = count;
            if count >= goal.target {
                updated.achieved = true;
                updated.current = goal.target;
            }

            (updated != *goal).then_some(updated)
        })
        .collect()
}
