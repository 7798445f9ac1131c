//! Database layer for habitally
//!
//! Provides SQLite storage for users, habits, the completion log and the
//! state derived from it.

mod repo;
pub mod schema;

pub use repo::Database;
