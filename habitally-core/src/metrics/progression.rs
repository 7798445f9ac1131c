//! Points, levels and achievement unlocks.
//!
//! The [`UserStats`] snapshot is rebuilt from scratch on every call; the
//! only value carried over from the previous snapshot is `longest_streak`,
//! which never decreases.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::UserStats;

/// Points awarded per day of current streak.
pub const POINTS_PER_STREAK_DAY: u32 = 10;
/// Points needed per level.
pub const POINTS_PER_LEVEL: u32 = 100;
/// Point value stored with every achievement.
pub const ACHIEVEMENT_POINTS: u32 = 10;

/// Level for a point total: `points / 100 + 1`.
pub fn level_for_points(points: u32) -> u32 {
    points / POINTS_PER_LEVEL + 1
}

/// Which stat an achievement rule looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMetric {
    HabitsCompleted,
    LongestStreak,
    Level,
}

impl RuleMetric {
    fn value(&self, stats: &UserStats) -> u32 {
        match self {
            RuleMetric::HabitsCompleted => stats.total_habits_completed,
            RuleMetric::LongestStreak => stats.longest_streak,
            RuleMetric::Level => stats.level,
        }
    }
}

/// A threshold rule that unlocks a named achievement.
#[derive(Debug, Clone, Copy)]
pub struct AchievementRule {
    pub name: &'static str,
    pub metric: RuleMetric,
    pub threshold: u32,
    /// May contain `{streak}` and `{level}` placeholders
    pub description: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

impl AchievementRule {
    /// Whether `stats` satisfies this rule.
    pub fn is_met(&self, stats: &UserStats) -> bool {
        self.metric.value(stats) >= self.threshold
    }

    fn describe(&self, stats: &UserStats) -> String {
        self.description
            .replace("{streak}", &stats.longest_streak.to_string())
            .replace("{level}", &stats.level.to_string())
    }
}

/// All achievement rules, each evaluated independently.
pub const ACHIEVEMENT_RULES: &[AchievementRule] = &[
    AchievementRule {
        name: "First Steps",
        metric: RuleMetric::HabitsCompleted,
        threshold: 1,
        description: "Completed your first habit!",
        icon: "fas fa-baby",
        color: "#10b981",
    },
    AchievementRule {
        name: "Week Warrior",
        metric: RuleMetric::HabitsCompleted,
        threshold: 7,
        description: "Completed habits for 7 days!",
        icon: "fas fa-calendar-week",
        color: "#6366f1",
    },
    AchievementRule {
        name: "Month Master",
        metric: RuleMetric::HabitsCompleted,
        threshold: 30,
        description: "Completed habits for 30 days!",
        icon: "fas fa-calendar-alt",
        color: "#8b5cf6",
    },
    AchievementRule {
        name: "Streak Master",
        metric: RuleMetric::LongestStreak,
        threshold: 10,
        description: "Maintained a {streak}-day streak!",
        icon: "fas fa-fire",
        color: "#f59e0b",
    },
    AchievementRule {
        name: "Rising Star",
        metric: RuleMetric::Level,
        threshold: 5,
        description: "Reached level {level}!",
        icon: "fas fa-star",
        color: "#ec4899",
    },
    AchievementRule {
        name: "Habit Hero",
        metric: RuleMetric::Level,
        threshold: 10,
        description: "Reached level {level}!",
        icon: "fas fa-crown",
        color: "#f59e0b",
    },
];

/// An achievement that became unlocked during a recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementUnlock {
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub points: u32,
}

/// Rebuild a user's stats from the current streaks of their active habits.
///
/// - `total_habits_completed` is the sum of `active_streaks`
/// - `longest_streak` is the larger of the previous value and the best
///   streak this cycle
/// - points are 10 per streak day, one level per 100 points
///
/// Rules whose name is already in `unlocked` are skipped, so each name is
/// returned at most once over the lifetime of a user.
pub fn recompute_user_stats(
    previous: &UserStats,
    active_streaks: &[u32],
    unlocked: &HashSet<String>,
    now: DateTime<Utc>,
) -> (UserStats, Vec<AchievementUnlock>) {
    let total_completed: u32 = active_streaks.iter().sum();
    let best_this_cycle = active_streaks.iter().copied().max().unwrap_or(0);
    let total_points = total_completed * POINTS_PER_STREAK_DAY;

    let stats = UserStats {
        user_id: previous.user_id,
        total_points,
        level: level_for_points(total_points),
        longest_streak: previous.longest_streak.max(best_this_cycle),
        total_habits_completed: total_completed,
        last_updated: now,
    };

    let unlocks = ACHIEVEMENT_RULES
        .iter()
        .filter(|rule| !unlocked.contains(rule.name) && rule.is_met(&stats))
        .map(|rule| AchievementUnlock {
            name: rule.name.to_string(),
            description: rule.describe(&stats),
            icon: rule.icon.to_string(),
            color: rule.color.to_string(),
            points: ACHIEVEMENT_POINTS,
        })
        .collect();

    (stats, unlocks)
}
