//! Tracker service
//!
//! The operations the presentation layer calls. Each one takes the acting
//! user as an explicit [`UserContext`], talks to the [`Database`] and runs
//! the metrics engine over the stored log. Derived state (stats, goals,
//! achievements) is always recomputed from the full log after a write,
//! never patched in place.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rand::Rng;
use serde::Serialize;

use crate::auth;
use crate::config::Config;
use crate::dashboard::{
    Dashboard, HabitHistory, HabitSummary, HistoryDay, DASHBOARD_ACHIEVEMENTS, DASHBOARD_INSIGHTS,
};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::insights::{select_insight, welcome_insights, HabitSnapshot};
use crate::metrics::{
    self, completion_window, longest_streak, AchievementUnlock, CompletionLogStore, StreakPolicy,
    COMPLETION_WINDOW_DAYS,
};
use crate::types::*;

/// Tunables the tracker needs from [`Config`].
#[derive(Debug, Clone, Copy)]
pub struct TrackerOptions {
    pub streak_policy: StreakPolicy,
    pub goal_target: u32,
    pub goal_days: u32,
    /// Probability that a toggle also generates an insight
    pub insight_chance: f64,
    /// bcrypt cost for new password hashes
    pub password_cost: u32,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for TrackerOptions {
    fn from(config: &Config) -> Self {
        Self {
            streak_policy: config.metrics.streak_policy,
            goal_target: config.goals.default_target,
            goal_days: config.goals.default_days,
            insight_chance: config.insights.generate_chance.clamp(0.0, 1.0),
            password_cost: config.auth.bcrypt_cost,
        }
    }
}

/// Everything that changed because of one completion toggle.
#[derive(Debug, Clone, Serialize)]
pub struct ToggleOutcome {
    pub habit_id: i64,
    pub date: NaiveDate,
    /// State of the entry after the toggle
    pub completed: bool,
    pub stats: UserStats,
    /// Achievements unlocked by this toggle
    pub unlocked: Vec<AchievementUnlock>,
    /// Goals whose progress moved
    pub updated_goals: Vec<Goal>,
    /// Insight generated alongside the toggle, if the dice said so
    pub insight: Option<Insight>,
}

/// Habit tracking operations over one database.
pub struct Tracker {
    db: Database,
    options: TrackerOptions,
}

impl Tracker {
    pub fn new(db: Database, options: TrackerOptions) -> Self {
        Self { db, options }
    }

    /// Tracker with options taken from a loaded [`Config`].
    pub fn from_config(db: Database, config: &Config) -> Self {
        Self::new(db, TrackerOptions::from(config))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn options(&self) -> &TrackerOptions {
        &self.options
    }

    // ============================================
    // Accounts
    // ============================================

    /// Register a user and seed their welcome insights.
    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<User> {
        let username = username.trim();
        let email = email.trim();

        if username.is_empty() || email.is_empty() || password.is_empty() || confirm_password.is_empty()
        {
            return Err(Error::InvalidInput("all fields are required".to_string()));
        }
        if !email.contains('@') {
            return Err(Error::InvalidInput(format!("not an email address: {}", email)));
        }
        if password != confirm_password {
            return Err(Error::InvalidInput("passwords do not match".to_string()));
        }

        let password_hash = auth::hash_password(password, self.options.password_cost)?;
        let now = Utc::now();
        let user = self.db.insert_user(username, email, &password_hash, now)?;

        for draft in welcome_insights() {
            self.db.insert_insight(user.id, &draft, now)?;
        }

        tracing::info!(user_id = user.id, username = %user.username, "Registered user");
        Ok(user)
    }

    /// Check an email/password pair.
    pub fn login(&self, email: &str, password: &str) -> Result<UserContext> {
        let user = match self.db.get_user_by_email(email.trim())? {
            Some(user) if auth::verify_password(password, &user.password_hash)? => user,
            _ => {
                tracing::warn!(email = %email, "Failed login");
                return Err(Error::InvalidCredentials);
            }
        };

        tracing::debug!(user_id = user.id, "Logged in");
        Ok(UserContext::from(&user))
    }

    /// Context for a known username, without a password check.
    ///
    /// For local, single-owner use where the database file itself is the
    /// credential.
    pub fn context_for(&self, username: &str) -> Result<UserContext> {
        self.db
            .get_user_by_username(username)?
            .map(|u| UserContext::from(&u))
            .ok_or_else(|| Error::UserNotFound(username.to_string()))
    }

    /// Delete the user and everything they own.
    pub fn delete_user(&self, ctx: &UserContext) -> Result<()> {
        if !self.db.delete_user(ctx.user_id)? {
            return Err(Error::UserNotFound(ctx.username.clone()));
        }
        tracing::info!(user_id = ctx.user_id, "Deleted user");
        Ok(())
    }

    // ============================================
    // Habits
    // ============================================

    /// Create a habit together with its default goal.
    ///
    /// The goal counts completions from `today` and is due
    /// `goal_days` later.
    pub fn create_habit(
        &self,
        ctx: &UserContext,
        mut habit: NewHabit,
        today: NaiveDate,
    ) -> Result<Habit> {
        habit.name = habit.name.trim().to_string();
        habit.category = habit.category.trim().to_string();
        if habit.name.is_empty() {
            return Err(Error::InvalidInput("habit name is required".to_string()));
        }
        if habit.category.is_empty() {
            return Err(Error::InvalidInput("habit category is required".to_string()));
        }

        let created = self.db.insert_habit(ctx.user_id, &habit, Utc::now())?;

        let goal_start = DateTime::<Utc>::from_naive_utc_and_offset(
            today.and_time(NaiveTime::MIN),
            Utc,
        );
        let description = format!(
            "Build consistency by completing this habit {} times within {} days",
            self.options.goal_target, self.options.goal_days
        );
        self.db.insert_goal(
            created.id,
            &format!("Complete {} for {} days", created.name, self.options.goal_target),
            Some(description.as_str()),
            self.options.goal_target,
            Some(today + Duration::days(i64::from(self.options.goal_days))),
            goal_start,
        )?;

        self.recompute_user_stats(ctx, today)?;

        tracing::info!(
            user_id = ctx.user_id,
            habit_id = created.id,
            name = %created.name,
            "Created habit"
        );
        Ok(created)
    }

    /// A user's habits, oldest first.
    pub fn list_habits(&self, ctx: &UserContext, include_inactive: bool) -> Result<Vec<Habit>> {
        self.db.list_habits(ctx.user_id, include_inactive)
    }

    /// Pause or resume a habit. Paused habits keep their log but drop out
    /// of stats and the dashboard.
    pub fn set_habit_active(
        &self,
        ctx: &UserContext,
        habit_id: i64,
        active: bool,
        today: NaiveDate,
    ) -> Result<Habit> {
        let mut habit = self.owned_habit(ctx, habit_id)?;
        if habit.is_active != active {
            self.db.set_habit_active(habit_id, active)?;
            habit.is_active = active;
            self.recompute_user_stats(ctx, today)?;
            tracing::info!(habit_id, active, "Changed habit state");
        }
        Ok(habit)
    }

    /// Delete a habit with its log and goals.
    pub fn delete_habit(&self, ctx: &UserContext, habit_id: i64, today: NaiveDate) -> Result<()> {
        self.owned_habit(ctx, habit_id)?;
        self.db.delete_habit(habit_id)?;
        self.recompute_user_stats(ctx, today)?;
        tracing::info!(user_id = ctx.user_id, habit_id, "Deleted habit");
        Ok(())
    }

    /// Flip the completion entry for `date`, then recompute everything
    /// that depends on it.
    ///
    /// `date` may be in the past to backfill a missed day. Streaks, stats
    /// and any insight are still judged as of `today`. Future dates are
    /// rejected.
    pub fn toggle_habit<R: Rng + ?Sized>(
        &self,
        ctx: &UserContext,
        habit_id: i64,
        date: NaiveDate,
        today: NaiveDate,
        rng: &mut R,
    ) -> Result<ToggleOutcome> {
        self.owned_habit(ctx, habit_id)?;
        if date > today {
            return Err(Error::InvalidInput(format!(
                "cannot complete {} before it happens (today is {})",
                date, today
            )));
        }

        let completed = self.db.toggle_log(habit_id, date)?;
        tracing::info!(habit_id, %date, %today, completed, "Toggled completion");

        let (stats, unlocked) = self.recompute_user_stats(ctx, today)?;
        let updated_goals = self.recompute_goals(habit_id)?;

        let insight = if rng.random_bool(self.options.insight_chance) {
            Some(self.generate_insight(ctx, today, rng)?)
        } else {
            None
        };

        Ok(ToggleOutcome {
            habit_id,
            date,
            completed,
            stats,
            unlocked,
            updated_goals,
            insight,
        })
    }

    /// Attach a note to a day of a habit.
    pub fn annotate(&self, ctx: &UserContext, habit_id: i64, date: NaiveDate, notes: &str) -> Result<()> {
        self.owned_habit(ctx, habit_id)?;
        self.db.set_log_notes(habit_id, date, notes)
    }

    /// Goals of one habit.
    pub fn list_goals(&self, ctx: &UserContext, habit_id: i64) -> Result<Vec<Goal>> {
        self.owned_habit(ctx, habit_id)?;
        self.db.list_goals(habit_id, false)
    }

    fn owned_habit(&self, ctx: &UserContext, habit_id: i64) -> Result<Habit> {
        let habit = self
            .db
            .get_habit(habit_id)?
            .ok_or(Error::HabitNotFound(habit_id))?;
        if habit.user_id != ctx.user_id {
            tracing::warn!(habit_id, user_id = ctx.user_id, "Habit belongs to another user");
            return Err(Error::Forbidden(format!("habit {}", habit_id)));
        }
        Ok(habit)
    }

    // ============================================
    // Derived state
    // ============================================

    /// Recompute progress of a habit's open goals and persist the changes.
    pub fn recompute_goals(&self, habit_id: i64) -> Result<Vec<Goal>> {
        let open = self.db.list_goals(habit_id, true)?;
        if open.is_empty() {
            return Ok(Vec::new());
        }

        let dates = self.db.list_completed_dates(habit_id)?;
        let updated = metrics::recompute_goals(&open, &dates);
        self.db.update_goal_progress(&updated)?;

        for goal in updated.iter().filter(|g| g.achieved) {
            tracing::info!(habit_id, goal_id = goal.id, "Goal achieved");
        }
        Ok(updated)
    }

    /// Rebuild the user's stats from their active habits and record any
    /// achievements that became unlocked.
    pub fn recompute_user_stats(
        &self,
        ctx: &UserContext,
        today: NaiveDate,
    ) -> Result<(UserStats, Vec<AchievementUnlock>)> {
        let habits = self.db.list_habits(ctx.user_id, false)?;
        let streaks = habits
            .iter()
            .map(|h| metrics::habit_streak(&self.db, h.id, today, self.options.streak_policy))
            .collect::<Result<Vec<_>>>()?;

        let previous = self
            .db
            .get_user_stats(ctx.user_id)?
            .unwrap_or_else(|| UserStats::new(ctx.user_id));
        let unlocked_names = self.db.achievement_names(ctx.user_id)?;

        let (stats, candidates) =
            metrics::recompute_user_stats(&previous, &streaks, &unlocked_names, Utc::now());
        self.db.upsert_user_stats(&stats)?;

        // A concurrent writer may have recorded the same name first
        let mut unlocked = Vec::with_capacity(candidates.len());
        for unlock in candidates {
            if self
                .db
                .insert_achievement(ctx.user_id, &unlock, stats.last_updated)?
            {
                tracing::info!(user_id = ctx.user_id, name = %unlock.name, "Achievement unlocked");
                unlocked.push(unlock);
            }
        }

        tracing::debug!(
            user_id = ctx.user_id,
            points = stats.total_points,
            level = stats.level,
            "Recomputed user stats"
        );
        Ok((stats, unlocked))
    }

    /// The user's stats snapshot, created on first access.
    pub fn user_stats(&self, ctx: &UserContext) -> Result<UserStats> {
        if let Some(stats) = self.db.get_user_stats(ctx.user_id)? {
            return Ok(stats);
        }
        let stats = UserStats::new(ctx.user_id);
        self.db.upsert_user_stats(&stats)?;
        Ok(stats)
    }

    // ============================================
    // Views
    // ============================================

    /// Dashboard for `today`.
    pub fn dashboard(&self, ctx: &UserContext, today: NaiveDate) -> Result<Dashboard> {
        let habits = self.db.list_habits(ctx.user_id, false)?;
        let summaries = habits
            .into_iter()
            .map(|habit| self.summarize(habit, today))
            .collect::<Result<Vec<_>>>()?;

        Ok(Dashboard::new(
            today,
            summaries,
            self.user_stats(ctx)?,
            self.db
                .list_achievements(ctx.user_id, Some(DASHBOARD_ACHIEVEMENTS))?,
            self.db.list_insights(ctx.user_id, Some(DASHBOARD_INSIGHTS))?,
        ))
    }

    fn summarize(&self, habit: Habit, today: NaiveDate) -> Result<HabitSummary> {
        let dates = self.db.list_completed_dates(habit.id)?;
        let (from, to) = completion_window(today);
        let logs = self.db.list_logs(habit.id, from, to)?;

        let mut week = [false; COMPLETION_WINDOW_DAYS as usize];
        for (date, completed) in &logs {
            let idx = (*date - from).num_days() as usize;
            if let Some(slot) = week.get_mut(idx) {
                *slot = *completed;
            }
        }

        Ok(HabitSummary {
            streak: metrics::current_streak(&dates, today, self.options.streak_policy),
            longest_streak: longest_streak(&dates),
            completion_rate: metrics::compute_completion_rate(&logs),
            completed_today: week[week.len() - 1],
            week,
            habit,
        })
    }

    /// Full per-habit log, including paused habits.
    pub fn history(&self, ctx: &UserContext) -> Result<Vec<HabitHistory>> {
        self.db
            .list_habits(ctx.user_id, true)?
            .into_iter()
            .map(|habit| {
                let days = self
                    .db
                    .list_habit_logs(habit.id)?
                    .into_iter()
                    .map(|log| HistoryDay {
                        date: log.date,
                        completed: log.completed,
                    })
                    .collect();
                Ok(HabitHistory {
                    habit_id: habit.id,
                    name: habit.name,
                    category: habit.category,
                    days,
                })
            })
            .collect()
    }

    /// Generate and store a new insight over all of the user's habits.
    pub fn generate_insight<R: Rng + ?Sized>(
        &self,
        ctx: &UserContext,
        today: NaiveDate,
        rng: &mut R,
    ) -> Result<Insight> {
        let snapshots = self
            .db
            .list_habits(ctx.user_id, true)?
            .into_iter()
            .map(|habit| {
                Ok(HabitSnapshot {
                    streak: metrics::habit_streak(
                        &self.db,
                        habit.id,
                        today,
                        self.options.streak_policy,
                    )?,
                    completion_rate: metrics::habit_completion_rate(&self.db, habit.id, today)?,
                    name: habit.name,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let draft = select_insight(&snapshots, rng);
        let insight = self.db.insert_insight(ctx.user_id, &draft, Utc::now())?;
        tracing::info!(
            user_id = ctx.user_id,
            kind = insight.kind.as_str(),
            "Generated insight"
        );
        Ok(insight)
    }

    /// All insights, newest first.
    pub fn list_insights(&self, ctx: &UserContext) -> Result<Vec<Insight>> {
        self.db.list_insights(ctx.user_id, None)
    }

    /// All achievements, newest first.
    pub fn list_achievements(&self, ctx: &UserContext) -> Result<Vec<Achievement>> {
        self.db.list_achievements(ctx.user_id, None)
    }
}
