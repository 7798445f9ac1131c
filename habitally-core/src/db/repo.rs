//! Database repository layer
//!
//! Provides query and insert operations for all entity types.

use crate::error::{Error, Result};
use crate::insights::InsightDraft;
use crate::metrics::{AchievementUnlock, CompletionLogStore};
use crate::types::*;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(idx: usize, value: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Database handle with connection pooling (single connection for now)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable foreign keys (for cascading deletes) and WAL mode
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        tracing::debug!(path = %path.display(), "Opened database");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.connection();
        super::schema::run_migrations(&conn)
    }

    /// Get the underlying connection (for advanced use)
    ///
    /// A panic while the lock was held does not leave SQLite in a torn
    /// state, so a poisoned lock is simply taken over.
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ============================================
    // User operations
    // ============================================

    /// Insert a new user. Username and email must both be unused.
    pub fn insert_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        created_at: DateTime<Utc>,
    ) -> Result<User> {
        let conn = self.connection();

        let username_taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)",
            [username],
            |r| r.get(0),
        )?;
        if username_taken {
            return Err(Error::AlreadyExists(format!("username '{}'", username)));
        }

        let email_taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)",
            [email],
            |r| r.get(0),
        )?;
        if email_taken {
            return Err(Error::AlreadyExists(format!("email '{}'", email)));
        }

        conn.execute(
            r#"
            INSERT INTO users (username, email, password_hash, timezone, created_at)
            VALUES (?1, ?2, ?3, 'UTC', ?4)
            "#,
            params![username, email, password_hash, created_at.to_rfc3339()],
        )?;

        Ok(User {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            timezone: "UTC".to_string(),
            created_at,
        })
    }

    /// Get a user by ID
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.connection();
        conn.query_row("SELECT * FROM users WHERE id = ?", [id], Self::row_to_user)
            .optional()
            .map_err(Error::from)
    }

    /// Get a user by username
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.connection();
        conn.query_row(
            "SELECT * FROM users WHERE username = ?",
            [username],
            Self::row_to_user,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Get a user by email
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.connection();
        conn.query_row(
            "SELECT * FROM users WHERE email = ?",
            [email],
            Self::row_to_user,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Delete a user and everything they own. Returns false if no such user.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        let conn = self.connection();
        let deleted = conn.execute("DELETE FROM users WHERE id = ?", [id])?;
        Ok(deleted > 0)
    }

    fn row_to_user(row: &Row) -> rusqlite::Result<User> {
        let created_at_str: String = row.get("created_at")?;
        Ok(User {
            id: row.get("id")?,
            username: row.get("username")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            timezone: row.get("timezone")?,
            created_at: parse_timestamp(&created_at_str),
        })
    }

    // ============================================
    // Habit operations
    // ============================================

    /// Insert a habit for a user, filling display defaults.
    pub fn insert_habit(
        &self,
        user_id: i64,
        habit: &NewHabit,
        created_at: DateTime<Utc>,
    ) -> Result<Habit> {
        let conn = self.connection();
        let color = habit
            .color
            .clone()
            .unwrap_or_else(|| DEFAULT_HABIT_COLOR.to_string());
        let icon = habit
            .icon
            .clone()
            .unwrap_or_else(|| DEFAULT_HABIT_ICON.to_string());

        conn.execute(
            r#"
            INSERT INTO habits (user_id, name, description, category, frequency,
                                target_days, color, icon, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, 1, ?8)
            "#,
            params![
                user_id,
                habit.name,
                habit.description,
                habit.category,
                habit.frequency.as_str(),
                color,
                icon,
                created_at.to_rfc3339(),
            ],
        )?;

        Ok(Habit {
            id: conn.last_insert_rowid(),
            user_id,
            name: habit.name.clone(),
            description: habit.description.clone(),
            category: habit.category.clone(),
            frequency: habit.frequency,
            target_days: 1,
            color,
            icon,
            is_active: true,
            created_at,
        })
    }

    /// Get a habit by ID
    pub fn get_habit(&self, id: i64) -> Result<Option<Habit>> {
        let conn = self.connection();
        conn.query_row("SELECT * FROM habits WHERE id = ?", [id], Self::row_to_habit)
            .optional()
            .map_err(Error::from)
    }

    /// List a user's habits, oldest first.
    pub fn list_habits(&self, user_id: i64, include_inactive: bool) -> Result<Vec<Habit>> {
        let conn = self.connection();
        let sql = if include_inactive {
            "SELECT * FROM habits WHERE user_id = ? ORDER BY created_at, id"
        } else {
            "SELECT * FROM habits WHERE user_id = ? AND is_active = 1 ORDER BY created_at, id"
        };
        let mut stmt = conn.prepare(sql)?;
        let habits = stmt
            .query_map([user_id], Self::row_to_habit)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(habits)
    }

    /// Flip the active flag. Returns false if no such habit.
    pub fn set_habit_active(&self, id: i64, active: bool) -> Result<bool> {
        let conn = self.connection();
        let updated = conn.execute(
            "UPDATE habits SET is_active = ?1 WHERE id = ?2",
            params![active, id],
        )?;
        Ok(updated > 0)
    }

    /// Delete a habit with its logs and goals. Returns false if no such habit.
    pub fn delete_habit(&self, id: i64) -> Result<bool> {
        let conn = self.connection();
        let deleted = conn.execute("DELETE FROM habits WHERE id = ?", [id])?;
        Ok(deleted > 0)
    }

    fn row_to_habit(row: &Row) -> rusqlite::Result<Habit> {
        let frequency_str: String = row.get("frequency")?;
        let created_at_str: String = row.get("created_at")?;

        Ok(Habit {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            category: row.get("category")?,
            frequency: frequency_str.parse().unwrap_or_default(),
            target_days: row.get("target_days")?,
            color: row.get("color")?,
            icon: row.get("icon")?,
            is_active: row.get("is_active")?,
            created_at: parse_timestamp(&created_at_str),
        })
    }

    // ============================================
    // Completion log operations
    // ============================================

    /// Toggle the entry for `(habit_id, date)` and return its new state.
    ///
    /// A missing entry is created as completed; an existing one is flipped.
    /// Runs as a single statement so two writers can never create two rows
    /// for the same day.
    pub fn toggle_log(&self, habit_id: i64, date: NaiveDate) -> Result<bool> {
        let conn = self.connection();
        let completed: bool = conn.query_row(
            r#"
            INSERT INTO habit_logs (habit_id, date, completed)
            VALUES (?1, ?2, 1)
            ON CONFLICT(habit_id, date) DO UPDATE SET completed = NOT completed
            RETURNING completed
            "#,
            params![habit_id, format_date(date)],
            |r| r.get(0),
        )?;
        Ok(completed)
    }

    /// Attach a note to the entry for `(habit_id, date)`, creating an
    /// uncompleted entry if none exists.
    pub fn set_log_notes(&self, habit_id: i64, date: NaiveDate, notes: &str) -> Result<()> {
        let conn = self.connection();
        conn.execute(
            r#"
            INSERT INTO habit_logs (habit_id, date, completed, notes)
            VALUES (?1, ?2, 0, ?3)
            ON CONFLICT(habit_id, date) DO UPDATE SET notes = excluded.notes
            "#,
            params![habit_id, format_date(date), notes],
        )?;
        Ok(())
    }

    /// Get the entry for a single day
    pub fn get_log(&self, habit_id: i64, date: NaiveDate) -> Result<Option<CompletionLog>> {
        let conn = self.connection();
        conn.query_row(
            "SELECT * FROM habit_logs WHERE habit_id = ?1 AND date = ?2",
            params![habit_id, format_date(date)],
            Self::row_to_log,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Full log for a habit, oldest first.
    pub fn list_habit_logs(&self, habit_id: i64) -> Result<Vec<CompletionLog>> {
        let conn = self.connection();
        let mut stmt = conn.prepare("SELECT * FROM habit_logs WHERE habit_id = ? ORDER BY date")?;
        let logs = stmt
            .query_map([habit_id], Self::row_to_log)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(logs)
    }

    fn row_to_log(row: &Row) -> rusqlite::Result<CompletionLog> {
        let date_str: String = row.get("date")?;
        Ok(CompletionLog {
            id: row.get("id")?,
            habit_id: row.get("habit_id")?,
            date: parse_date(2, &date_str)?,
            completed: row.get("completed")?,
            notes: row.get("notes")?,
        })
    }

    // ============================================
    // Goal operations
    // ============================================

    /// Insert a goal for a habit.
    pub fn insert_goal(
        &self,
        habit_id: i64,
        title: &str,
        description: Option<&str>,
        target: u32,
        target_date: Option<NaiveDate>,
        created_at: DateTime<Utc>,
    ) -> Result<Goal> {
        let conn = self.connection();
        conn.execute(
            r#"
            INSERT INTO habit_goals (habit_id, title, description, target_value,
                                     current_value, target_date, is_achieved, created_at)
            VALUES (?1, ?2, ?3, ?4, 0, ?5, 0, ?6)
            "#,
            params![
                habit_id,
                title,
                description,
                target,
                target_date.map(format_date),
                created_at.to_rfc3339(),
            ],
        )?;

        Ok(Goal {
            id: conn.last_insert_rowid(),
            habit_id,
            title: title.to_string(),
            description: description.map(str::to_string),
            target,
            current: 0,
            target_date,
            achieved: false,
            created_at,
        })
    }

    /// List goals of a habit; `open_only` skips achieved ones.
    pub fn list_goals(&self, habit_id: i64, open_only: bool) -> Result<Vec<Goal>> {
        let conn = self.connection();
        let sql = if open_only {
            "SELECT * FROM habit_goals WHERE habit_id = ? AND is_achieved = 0 ORDER BY id"
        } else {
            "SELECT * FROM habit_goals WHERE habit_id = ? ORDER BY id"
        };
        let mut stmt = conn.prepare(sql)?;
        let goals = stmt
            .query_map([habit_id], Self::row_to_goal)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(goals)
    }

    /// Get a goal by ID
    pub fn get_goal(&self, id: i64) -> Result<Option<Goal>> {
        let conn = self.connection();
        conn.query_row(
            "SELECT * FROM habit_goals WHERE id = ?",
            [id],
            Self::row_to_goal,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Persist recomputed progress for a set of goals in one transaction.
    pub fn update_goal_progress(&self, goals: &[Goal]) -> Result<()> {
        let mut conn = self.connection();
        let tx = conn.transaction()?;

        for goal in goals {
            let updated = tx.execute(
                "UPDATE habit_goals SET current_value = ?1, is_achieved = ?2 WHERE id = ?3",
                params![goal.current, goal.achieved, goal.id],
            )?;
            if updated == 0 {
                return Err(Error::GoalNotFound(goal.id));
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn row_to_goal(row: &Row) -> rusqlite::Result<Goal> {
        let target_date_str: Option<String> = row.get("target_date")?;
        let created_at_str: String = row.get("created_at")?;

        Ok(Goal {
            id: row.get("id")?,
            habit_id: row.get("habit_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            target: row.get("target_value")?,
            current: row.get("current_value")?,
            target_date: target_date_str
                .map(|s| parse_date(6, &s))
                .transpose()?,
            achieved: row.get("is_achieved")?,
            created_at: parse_timestamp(&created_at_str),
        })
    }

    // ============================================
    // User stats operations
    // ============================================

    /// Get the stats snapshot for a user, if one was ever stored.
    pub fn get_user_stats(&self, user_id: i64) -> Result<Option<UserStats>> {
        let conn = self.connection();
        conn.query_row(
            "SELECT * FROM user_stats WHERE user_id = ?",
            [user_id],
            |row| {
                let last_updated_str: String = row.get("last_updated")?;
                Ok(UserStats {
                    user_id: row.get("user_id")?,
                    total_points: row.get("total_points")?,
                    level: row.get("level")?,
                    longest_streak: row.get("longest_streak")?,
                    total_habits_completed: row.get("total_habits_completed")?,
                    last_updated: parse_timestamp(&last_updated_str),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    /// Replace the stats snapshot for a user.
    pub fn upsert_user_stats(&self, stats: &UserStats) -> Result<()> {
        let conn = self.connection();
        conn.execute(
            r#"
            INSERT INTO user_stats (user_id, total_points, level, longest_streak,
                                    total_habits_completed, last_updated)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user_id) DO UPDATE SET
                total_points = excluded.total_points,
                level = excluded.level,
                longest_streak = MAX(user_stats.longest_streak, excluded.longest_streak),
                total_habits_completed = excluded.total_habits_completed,
                last_updated = excluded.last_updated
            "#,
            params![
                stats.user_id,
                stats.total_points,
                stats.level,
                stats.longest_streak,
                stats.total_habits_completed,
                stats.last_updated.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ============================================
    // Achievement operations
    // ============================================

    /// Record an unlocked achievement.
    ///
    /// Returns false when the user already has an achievement with this name.
    pub fn insert_achievement(
        &self,
        user_id: i64,
        unlock: &AchievementUnlock,
        unlocked_at: DateTime<Utc>,
    ) -> Result<bool> {
        let conn = self.connection();
        let inserted = conn.execute(
            r#"
            INSERT OR IGNORE INTO achievements (user_id, name, description, icon, color, points, unlocked_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                user_id,
                unlock.name,
                unlock.description,
                unlock.icon,
                unlock.color,
                unlock.points,
                unlocked_at.to_rfc3339(),
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Names of every achievement a user has unlocked.
    pub fn achievement_names(&self, user_id: i64) -> Result<HashSet<String>> {
        let conn = self.connection();
        let mut stmt = conn.prepare("SELECT name FROM achievements WHERE user_id = ?")?;
        let names = stmt
            .query_map([user_id], |r| r.get(0))?
            .collect::<rusqlite::Result<HashSet<String>>>()?;
        Ok(names)
    }

    /// Achievements of a user, most recent first.
    pub fn list_achievements(&self, user_id: i64, limit: Option<usize>) -> Result<Vec<Achievement>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM achievements
            WHERE user_id = ?1
            ORDER BY unlocked_at DESC, id DESC
            LIMIT ?2
            "#,
        )?;
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let achievements = stmt
            .query_map(params![user_id, limit], |row| {
                let unlocked_at_str: String = row.get("unlocked_at")?;
                Ok(Achievement {
                    id: row.get("id")?,
                    user_id: row.get("user_id")?,
                    name: row.get("name")?,
                    description: row.get("description")?,
                    icon: row.get("icon")?,
                    color: row.get("color")?,
                    points: row.get("points")?,
                    unlocked_at: parse_timestamp(&unlocked_at_str),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(achievements)
    }

    // ============================================
    // Insight operations
    // ============================================

    /// Append an insight for a user.
    pub fn insert_insight(
        &self,
        user_id: i64,
        draft: &InsightDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Insight> {
        let conn = self.connection();
        conn.execute(
            r#"
            INSERT INTO insights (user_id, kind, title, message, confidence, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                user_id,
                draft.kind.as_str(),
                draft.title,
                draft.message,
                draft.confidence.min(100),
                created_at.to_rfc3339(),
            ],
        )?;

        Ok(Insight {
            id: conn.last_insert_rowid(),
            user_id,
            kind: draft.kind,
            title: draft.title.clone(),
            message: draft.message.clone(),
            confidence: draft.confidence.min(100),
            created_at,
        })
    }

    /// Insights of a user, most recent first.
    pub fn list_insights(&self, user_id: i64, limit: Option<usize>) -> Result<Vec<Insight>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM insights
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2
            "#,
        )?;
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let insights = stmt
            .query_map(params![user_id, limit], |row| {
                let kind_str: String = row.get("kind")?;
                let created_at_str: String = row.get("created_at")?;
                Ok(Insight {
                    id: row.get("id")?,
                    user_id: row.get("user_id")?,
                    kind: kind_str.parse().unwrap_or(InsightKind::Tip),
                    title: row.get("title")?,
                    message: row.get("message")?,
                    confidence: row.get("confidence")?,
                    created_at: parse_timestamp(&created_at_str),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(insights)
    }
}

impl CompletionLogStore for Database {
    fn list_completed_dates(&self, habit_id: i64) -> Result<Vec<NaiveDate>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(
            "SELECT date FROM habit_logs WHERE habit_id = ? AND completed = 1 ORDER BY date DESC",
        )?;
        let dates = stmt
            .query_map([habit_id], |row| {
                let s: String = row.get(0)?;
                parse_date(0, &s)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(dates)
    }

    fn list_logs(
        &self,
        habit_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(NaiveDate, bool)>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(
            r#"
            SELECT date, completed FROM habit_logs
            WHERE habit_id = ?1 AND date >= ?2 AND date <= ?3
            ORDER BY date
            "#,
        )?;
        let logs = stmt
            .query_map(params![habit_id, format_date(from), format_date(to)], |row| {
                let s: String = row.get(0)?;
                Ok((parse_date(0, &s)?, row.get(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(logs)
    }

    fn upsert_log(&self, habit_id: i64, date: NaiveDate, completed: bool) -> Result<()> {
        let conn = self.connection();
        conn.execute(
            r#"
            INSERT INTO habit_logs (habit_id, date, completed)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(habit_id, date) DO UPDATE SET completed = excluded.completed
            "#,
            params![habit_id, format_date(date), completed],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn seed_user(db: &Database) -> User {
        db.insert_user("ada", "ada@example.com", "hash", Utc::now())
            .unwrap()
    }

    fn seed_habit(db: &Database, user_id: i64) -> Habit {
        db.insert_habit(user_id, &NewHabit::new("Read", "learning"), Utc::now())
            .unwrap()
    }

    #[test]
    fn test_user_roundtrip() {
        let db = test_db();
        let user = seed_user(&db);

        let by_name = db.get_user_by_username("ada").unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert_eq!(by_name.timezone, "UTC");

        let by_email = db.get_user_by_email("ada@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        assert!(db.get_user(999).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_and_email_rejected() {
        let db = test_db();
        seed_user(&db);

        let err = db
            .insert_user("ada", "other@example.com", "hash", Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(ref what) if what.contains("username")));

        let err = db
            .insert_user("bob", "ada@example.com", "hash", Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(ref what) if what.contains("email")));
    }

    #[test]
    fn test_habit_defaults_and_listing() {
        let db = test_db();
        let user = seed_user(&db);
        let habit = seed_habit(&db, user.id);

        let stored = db.get_habit(habit.id).unwrap().unwrap();
        assert_eq!(stored.color, DEFAULT_HABIT_COLOR);
        assert_eq!(stored.icon, DEFAULT_HABIT_ICON);
        assert_eq!(stored.frequency, Frequency::Daily);
        assert!(stored.is_active);

        assert!(db.set_habit_active(habit.id, false).unwrap());
        assert!(db.list_habits(user.id, false).unwrap().is_empty());
        assert_eq!(db.list_habits(user.id, true).unwrap().len(), 1);
        assert!(!db.set_habit_active(999, false).unwrap());
    }

    #[test]
    fn test_toggle_flips_single_row() {
        let db = test_db();
        let user = seed_user(&db);
        let habit = seed_habit(&db, user.id);
        let today = day("2024-01-05");

        assert!(db.toggle_log(habit.id, today).unwrap());
        assert!(!db.toggle_log(habit.id, today).unwrap());
        assert!(db.toggle_log(habit.id, today).unwrap());

        let logs = db.list_habit_logs(habit.id).unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].completed);
        assert_eq!(logs[0].date, today);
    }

    #[test]
    fn test_log_store_contract() {
        let db = test_db();
        let user = seed_user(&db);
        let habit = seed_habit(&db, user.id);

        db.upsert_log(habit.id, day("2024-01-03"), true).unwrap();
        db.upsert_log(habit.id, day("2024-01-05"), true).unwrap();
        db.upsert_log(habit.id, day("2024-01-04"), false).unwrap();
        db.upsert_log(habit.id, day("2024-01-04"), true).unwrap();

        assert_eq!(
            db.list_completed_dates(habit.id).unwrap(),
            vec![day("2024-01-05"), day("2024-01-04"), day("2024-01-03")]
        );
        assert_eq!(
            db.list_logs(habit.id, day("2024-01-04"), day("2024-01-05"))
                .unwrap(),
            vec![(day("2024-01-04"), true), (day("2024-01-05"), true)]
        );
    }

    #[test]
    fn test_notes_do_not_change_completion() {
        let db = test_db();
        let user = seed_user(&db);
        let habit = seed_habit(&db, user.id);
        let today = day("2024-01-05");

        db.toggle_log(habit.id, today).unwrap();
        db.set_log_notes(habit.id, today, "felt great").unwrap();

        let log = db.get_log(habit.id, today).unwrap().unwrap();
        assert!(log.completed);
        assert_eq!(log.notes.as_deref(), Some("felt great"));
    }

    #[test]
    fn test_delete_habit_cascades() {
        let db = test_db();
        let user = seed_user(&db);
        let habit = seed_habit(&db, user.id);
        db.toggle_log(habit.id, day("2024-01-05")).unwrap();
        let goal = db
            .insert_goal(habit.id, "Week", None, 7, None, Utc::now())
            .unwrap();

        assert!(db.delete_habit(habit.id).unwrap());
        assert!(db.list_habit_logs(habit.id).unwrap().is_empty());
        assert!(db.get_goal(goal.id).unwrap().is_none());
    }

    #[test]
    fn test_delete_user_cascades() {
        let db = test_db();
        let user = seed_user(&db);
        let habit = seed_habit(&db, user.id);
        db.upsert_user_stats(&UserStats::new(user.id)).unwrap();
        db.insert_insight(user.id, &crate::insights::welcome_insights()[0], Utc::now())
            .unwrap();

        assert!(db.delete_user(user.id).unwrap());
        assert!(db.get_habit(habit.id).unwrap().is_none());
        assert!(db.get_user_stats(user.id).unwrap().is_none());
        assert!(db.list_insights(user.id, None).unwrap().is_empty());
    }

    #[test]
    fn test_goal_progress_persisted() {
        let db = test_db();
        let user = seed_user(&db);
        let habit = seed_habit(&db, user.id);
        let mut goal = db
            .insert_goal(
                habit.id,
                "Week",
                Some("desc"),
                7,
                Some(day("2024-01-08")),
                Utc::now(),
            )
            .unwrap();

        goal.current = 7;
        goal.achieved = true;
        db.update_goal_progress(std::slice::from_ref(&goal)).unwrap();

        assert!(db.list_goals(habit.id, true).unwrap().is_empty());
        let stored = db.get_goal(goal.id).unwrap().unwrap();
        assert_eq!(stored.current, 7);
        assert!(stored.achieved);
        assert_eq!(stored.target_date, Some(day("2024-01-08")));

        goal.id = 999;
        assert!(matches!(
            db.update_goal_progress(&[goal]),
            Err(Error::GoalNotFound(999))
        ));
    }

    #[test]
    fn test_user_stats_upsert_keeps_longest_streak() {
        let db = test_db();
        let user = seed_user(&db);
        assert!(db.get_user_stats(user.id).unwrap().is_none());

        let mut stats = UserStats::new(user.id);
        stats.longest_streak = 9;
        stats.total_points = 40;
        db.upsert_user_stats(&stats).unwrap();

        stats.longest_streak = 3;
        stats.total_points = 10;
        db.upsert_user_stats(&stats).unwrap();

        let stored = db.get_user_stats(user.id).unwrap().unwrap();
        assert_eq!(stored.longest_streak, 9);
        assert_eq!(stored.total_points, 10);
    }

    #[test]
    fn test_achievement_name_is_idempotency_key() {
        let db = test_db();
        let user = seed_user(&db);
        let unlock = AchievementUnlock {
            name: "First Steps".to_string(),
            description: "Completed your first habit!".to_string(),
            icon: "fas fa-baby".to_string(),
            color: "#10b981".to_string(),
            points: 10,
        };

        assert!(db.insert_achievement(user.id, &unlock, Utc::now()).unwrap());
        assert!(!db.insert_achievement(user.id, &unlock, Utc::now()).unwrap());

        assert_eq!(db.list_achievements(user.id, None).unwrap().len(), 1);
        assert!(db.achievement_names(user.id).unwrap().contains("First Steps"));
    }

    #[test]
    fn test_insights_listed_newest_first() {
        let db = test_db();
        let user = seed_user(&db);
        let drafts = crate::insights::welcome_insights();
        let base = Utc::now();
        for (i, draft) in drafts.iter().enumerate() {
            db.insert_insight(user.id, draft, base + chrono::Duration::seconds(i as i64))
                .unwrap();
        }

        let all = db.list_insights(user.id, None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].title, drafts[2].title);

        let limited = db.list_insights(user.id, Some(2)).unwrap();
        assert_eq!(limited.len(), 2);
    }
}
