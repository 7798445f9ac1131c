//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: Initial schema
    r#"
    -- ============================================
    -- Source of truth: users, habits, completion log
    -- ============================================

    CREATE TABLE users (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        username         TEXT NOT NULL UNIQUE,
        email            TEXT NOT NULL UNIQUE,
        password_hash    TEXT NOT NULL,
        timezone         TEXT NOT NULL DEFAULT 'UTC',
        created_at       DATETIME NOT NULL
    );

    CREATE TABLE habits (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id          INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name             TEXT NOT NULL,
        description      TEXT,
        category         TEXT NOT NULL,
        frequency        TEXT NOT NULL DEFAULT 'daily',
        target_days      INTEGER NOT NULL DEFAULT 1,
        color            TEXT NOT NULL DEFAULT '#6366f1',
        icon             TEXT NOT NULL DEFAULT 'fas fa-check-circle',
        is_active        BOOLEAN NOT NULL DEFAULT 1,
        created_at       DATETIME NOT NULL
    );

    CREATE INDEX idx_habits_user ON habits(user_id, is_active);

    -- One row per (habit, day)
    CREATE TABLE habit_logs (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        habit_id         INTEGER NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
        date             DATE NOT NULL,
        completed        BOOLEAN NOT NULL DEFAULT 0,
        notes            TEXT,

        UNIQUE(habit_id, date)
    );

    -- ============================================
    -- Derived state (regenerable from habit_logs)
    -- ============================================

    CREATE TABLE habit_goals (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        habit_id         INTEGER NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
        title            TEXT NOT NULL,
        description      TEXT,
        target_value     INTEGER NOT NULL,
        current_value    INTEGER NOT NULL DEFAULT 0,
        target_date      DATE,
        is_achieved      BOOLEAN NOT NULL DEFAULT 0,
        created_at       DATETIME NOT NULL
    );

    CREATE INDEX idx_habit_goals_habit ON habit_goals(habit_id, is_achieved);

    CREATE TABLE user_stats (
        user_id                 INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
        total_points            INTEGER NOT NULL DEFAULT 0,
        level                   INTEGER NOT NULL DEFAULT 1,
        longest_streak          INTEGER NOT NULL DEFAULT 0,
        total_habits_completed  INTEGER NOT NULL DEFAULT 0,
        last_updated            DATETIME NOT NULL
    );

    -- Append-only; the name is the idempotency key within a user
    CREATE TABLE achievements (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id          INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name             TEXT NOT NULL,
        description      TEXT NOT NULL,
        icon             TEXT NOT NULL DEFAULT 'fas fa-trophy',
        color            TEXT NOT NULL DEFAULT '#f59e0b',
        points           INTEGER NOT NULL DEFAULT 10,
        unlocked_at      DATETIME NOT NULL,

        UNIQUE(user_id, name)
    );

    -- Append-only
    CREATE TABLE insights (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id          INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        kind             TEXT NOT NULL,
        title            TEXT NOT NULL,
        message          TEXT NOT NULL,
        confidence       INTEGER NOT NULL CHECK (confidence BETWEEN 0 AND 100),
        created_at       DATETIME NOT NULL
    );

    CREATE INDEX idx_insights_user ON insights(user_id, created_at);
    "#,
    // Version 2: Date-range lookups on the completion log
    r#"
    CREATE INDEX IF NOT EXISTS idx_habit_logs_completed ON habit_logs(habit_id, completed, date);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
