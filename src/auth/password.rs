//! Password hashing and verification using bcrypt
//!
//! bcrypt is CPU bound, so the async variants run it on the blocking pool.

use crate::core::error::{Result, ServiceError};
use tokio::task;

/// Hash a password using bcrypt
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost)
        .map_err(|e| ServiceError::PasswordHashError(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash)
        .map_err(|e| ServiceError::PasswordHashError(format!("Failed to verify password: {}", e)))
}

/// Hash a password without blocking the async runtime
pub async fn hash_password_async(password: String, cost: u32) -> Result<String> {
    task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| ServiceError::TaskError(format!("Password hashing task panicked: {}", e)))?
}

/// Compare a plaintext password against a stored hash.
///
/// Resolves to `Ok(false)` on a mismatch and to an error only when the hash
/// cannot be processed.
pub async fn compare(plain: &str, hash: &str) -> Result<bool> {
    let plain = plain.to_string();
    let hash = hash.to_string();

    task::spawn_blocking(move || verify_password(&plain, &hash))
        .await
        .map_err(|e| {
            ServiceError::TaskError(format!("Password verification task panicked: {}", e))
        })?
}
