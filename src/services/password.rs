//! Password hashing and policy
//!
//! Hashes are Argon2id PHC strings (`$argon2id$v=19$...`) carrying their own
//! salt and parameters. Hashing is CPU and memory heavy, so request handlers
//! go through [`hash`] and [`verify`], which run on the blocking pool.

use crate::error::{AppError, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

const MIN_PASSWORD_LEN: usize = 8;

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Other(format!("Failed to hash password: {}", e)))
}

/// Unparseable hashes never verify
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::warn!("Stored password hash is not a valid PHC string: {}", e);
            false
        }
    }
}

/// [`hash_password`] on the blocking pool
pub async fn hash(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Other(format!("Password hashing task failed: {}", e)))?
}

/// [`verify_password`] on the blocking pool
pub async fn verify(password: String, stored: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| AppError::Other(format!("Password verification task failed: {}", e)))
}

/// Reject passwords that do not match their confirmation or are too weak
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<()> {
    if password != confirmation {
        return Err(AppError::InvalidInput("Passwords don't match".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(format!(
            "Password must contain at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidInput(
            "Password can't be entirely numeric".to_string(),
        ));
    }
    Ok(())
}
