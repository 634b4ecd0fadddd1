//! # Password Hashing
//!
//! Passwords are stored as Argon2id PHC strings (`$argon2id$v=19$...`),
//! which carry their own random salt and parameters. Hashing is CPU-bound,
//! so it runs on the blocking thread pool instead of a runtime worker.

use crate::error::{AppError, AppResult};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::sync::OnceLock;

/// Hash a plaintext password with a fresh salt.
pub async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {e}")))?
}

/// Check `password` against a stored hash.
///
/// With `None` (unknown user) the password is checked against a fixed
/// dummy hash and `false` is returned, so both outcomes cost the same.
pub async fn verify_password(password: String, stored_hash: Option<String>) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => verify_blocking(&password, &hash),
        None => {
            verify_blocking(&password, dummy_hash());
            false
        }
    })
    .await
    .map_err(|e| AppError::Internal(format!("Password verification task failed: {e}")))
}

fn hash_blocking(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

fn verify_blocking(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| hash_blocking("not-a-real-password").unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_is_salted_phc_string_that_verifies() {
        let first = hash_password("correct horse".into()).await.unwrap();
        let second = hash_password("correct horse".into()).await.unwrap();

        assert!(first.starts_with("$argon2id$"));
        assert!(!first.contains("correct horse"));
        // Fresh salt every time.
        assert_ne!(first, second);

        assert!(verify_password("correct horse".into(), Some(first.clone())).await.unwrap());
        assert!(!verify_password("battery staple".into(), Some(first)).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_user_never_verifies() {
        assert!(!verify_password("not-a-real-password".into(), None).await.unwrap());
    }

    #[tokio::test]
    async fn garbage_hash_does_not_verify() {
        assert!(!verify_password("anything".into(), Some("plaintext".into())).await.unwrap());
    }
}
