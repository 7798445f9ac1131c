//! Core domain types for habitally
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **User** | A registered person; owns every other entity |
//! | **Habit** | Something the user wants to do every day (or week) |
//! | **CompletionLog** | One row per (habit, calendar day) saying whether it was done |
//! | **Goal** | A completion-count target attached to a habit |
//! | **UserStats** | Derived points/level/streak snapshot, recomputed on every toggle |
//! | **Achievement** | A named milestone, unlocked at most once per user |
//! | **Insight** | A templated advisory message |
//!
//! Calendar days are [`NaiveDate`]s; nothing in the log carries a time of day.
//! Everything derived (streaks, rates, stats, goal progress) is regenerable
//! from the log and is never patched incrementally.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Users
// ============================================

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Unique login handle
    pub username: String,
    /// Unique email address
    pub email: String,
    /// Salted digest, see [`crate::auth`]
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// IANA timezone name (informational, defaults to UTC)
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

/// Identity of the user an operation acts for.
///
/// Every [`crate::Tracker`] operation takes one of these explicitly instead of
/// reading an ambient "current user".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserContext {
    pub user_id: i64,
    pub username: String,
}

impl From<&User> for UserContext {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
        }
    }
}

// ============================================
// Habits
// ============================================

/// How often a habit is meant to be done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Custom,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Custom => "custom",
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "custom" => Ok(Frequency::Custom),
            _ => Err(format!("unknown frequency: {}", s)),
        }
    }
}

/// Default UI color for habits
pub const DEFAULT_HABIT_COLOR: &str = "#6366f1";
/// Default icon for habits
pub const DEFAULT_HABIT_ICON: &str = "fas fa-check-circle";

/// A tracked habit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub frequency: Frequency,
    /// Days per week for weekly habits
    pub target_days: u32,
    /// Hex color for display
    pub color: String,
    /// Icon identifier for display
    pub icon: String,
    /// Inactive habits are kept but excluded from stats
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a habit.
#[derive(Debug, Clone, Default)]
pub struct NewHabit {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl NewHabit {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            ..Default::default()
        }
    }
}

// ============================================
// Completion log
// ============================================

/// Whether a habit was done on a given day.
///
/// At most one entry exists per (habit, date); writes are upserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionLog {
    pub id: i64,
    pub habit_id: i64,
    pub date: NaiveDate,
    pub completed: bool,
    pub notes: Option<String>,
}

// ============================================
// Goals
// ============================================

/// A completion-count target for a habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub habit_id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Completions required
    pub target: u32,
    /// Completions counted since `created_at`, never above `target`
    pub current: u32,
    pub target_date: Option<NaiveDate>,
    pub achieved: bool,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    /// Progress as a whole percentage, capped at 100.
    pub fn progress_percentage(&self) -> u32 {
        if self.target == 0 {
            return 0;
        }
        (self.current * 100 / self.target).min(100)
    }
}

// ============================================
// Stats and achievements
// ============================================

/// Derived per-user progression snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: i64,
    pub total_points: u32,
    pub level: u32,
    /// Best streak ever observed; never decreases
    pub longest_streak: u32,
    /// Sum of the active habits' current streaks
    pub total_habits_completed: u32,
    pub last_updated: DateTime<Utc>,
}

impl UserStats {
    /// A fresh snapshot: no points, level 1.
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            total_points: 0,
            level: 1,
            longest_streak: 0,
            total_habits_completed: 0,
            last_updated: Utc::now(),
        }
    }

    /// Points needed for the next level (`level * 100`).
    pub fn next_level_points(&self) -> u32 {
        self.level * 100
    }

    /// Percentage towards the next level, capped at 100.
    pub fn progress_to_next_level(&self) -> u32 {
        let next = self.next_level_points();
        if next == 0 {
            return 0;
        }
        ((self.total_points % next) * 100 / next).min(100)
    }
}

/// An unlocked milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: i64,
    pub user_id: i64,
    /// Unique per user
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub points: u32,
    pub unlocked_at: DateTime<Utc>,
}

// ============================================
// Insights
// ============================================

/// Category of a templated insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Motivation,
    Improvement,
    Trend,
    Tip,
}

impl InsightKind {
    /// All kinds, in selection order.
    pub const ALL: [InsightKind; 4] = [
        InsightKind::Motivation,
        InsightKind::Improvement,
        InsightKind::Trend,
        InsightKind::Tip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::Motivation => "motivation",
            InsightKind::Improvement => "improvement",
            InsightKind::Trend => "trend",
            InsightKind::Tip => "tip",
        }
    }
}

impl std::str::FromStr for InsightKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "motivation" => Ok(InsightKind::Motivation),
            "improvement" => Ok(InsightKind::Improvement),
            "trend" => Ok(InsightKind::Trend),
            "tip" => Ok(InsightKind::Tip),
            _ => Err(format!("unknown insight kind: {}", s)),
        }
    }
}

/// A stored insight message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub id: i64,
    pub user_id: i64,
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
    /// 0-100
    pub confidence: u8,
    pub created_at: DateTime<Utc>,
}
