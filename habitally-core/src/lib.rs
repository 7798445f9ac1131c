//! # habitally-core
//!
//! Core library for habitally - a habit tracker with streaks, goals and
//! achievements.
//!
//! This library provides:
//! - Domain types for users, habits, completion logs and goals
//! - The metrics engine (streaks, completion rates, goal progress, points)
//! - Templated insight selection
//! - Database storage layer with SQLite
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through two layers:
//! - **Source of truth:** users, habits and the completion log (one row per
//!   habit and day)
//! - **Derived:** stats, goal progress, achievements and insights, rebuilt
//!   from the log after every write
//!
//! ## Example
//!
//! ```rust,no_run
//! use habitally_core::{Config, Database, NewHabit, Tracker};
//!
//! let config = Config::load().expect("failed to load config");
//! let db = Database::open(&config.resolved_database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! let tracker = Tracker::from_config(db, &config);
//! let ctx = tracker.context_for("ada").expect("unknown user");
//! let today = chrono::Utc::now().date_naive();
//! tracker
//!     .create_habit(&ctx, NewHabit::new("Read", "learning"), today)
//!     .expect("failed to create habit");
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use dashboard::{Dashboard, HabitHistory, HabitSummary};
pub use db::Database;
pub use error::{Error, Result};
pub use tracker::{ToggleOutcome, Tracker, TrackerOptions};
pub use types::*;

// Public modules
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod format;
pub mod insights;
pub mod logging;
pub mod metrics;
pub mod tracker;
pub mod types;
