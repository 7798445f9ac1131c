//! Error types for habitally-core

use thiserror::Error;

/// Main error type for the habitally-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Password hashing error
    #[error("password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// User not found (by id, username or email)
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Habit not found
    #[error("habit not found: {0}")]
    HabitNotFound(i64),

    /// Goal not found
    #[error("goal not found: {0}")]
    GoalNotFound(i64),

    /// Missing or malformed input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unique field already taken (username, email)
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// Email/password pair did not match
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Entity belongs to another user
    #[error("forbidden: {0}")]
    Forbidden(String),
}

/// Result type alias for habitally-core
pub type Result<T> = std::result::Result<T, Error>;
