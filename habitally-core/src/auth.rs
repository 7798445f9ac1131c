//! Password hashing
//!
//! Hashes are bcrypt strings (`$2b$<cost>$...`) carrying their own salt and
//! work factor, so the cost can be raised later without invalidating
//! stored hashes.

use crate::error::Result;

pub use bcrypt::DEFAULT_COST;

/// Hash a password at the given bcrypt cost (4-31).
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Check a password against a stored hash.
///
/// A hash that is not valid bcrypt is an error, not a mismatch.
pub fn verify_password(password: &str, stored: &str) -> Result<bool> {
    Ok(bcrypt::verify(password, stored)?)
}
