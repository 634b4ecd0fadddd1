use crate::db::models::User;
use crate::error::{AppError, AppResult};
use sqlx::SqlitePool;

/// Insert a user. A unique-constraint hit on `username` becomes `DuplicateIdentity`,
/// so two concurrent registrations of the same name cannot both succeed.
pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> AppResult<User> {
    let user = User::new(username.to_string(), email.to_string(), password_hash.to_string());

    sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.created_at)
    .execute(pool)
    .await
    .map_err(|e| match e.as_database_error() {
        Some(db) if db.is_unique_violation() => duplicate_username(username),
        _ => AppError::Database(e),
    })?;

    Ok(user)
}

pub async fn find_optional_by_username(pool: &SqlitePool, username: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> AppResult<User> {
    find_optional_by_username(pool, username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", username)))
}

#[cfg(any(test, feature = "test-support"))]
pub async fn find_by_id(pool: &SqlitePool, user_id: &str) -> AppResult<User> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| crate::error::not_found_or_db(e, || format!("User with id '{}' not found", user_id)))?;

    Ok(user)
}

#[cfg(any(test, feature = "test-support"))]
pub async fn count(pool: &SqlitePool) -> AppResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub fn duplicate_username(username: &str) -> AppError {
    AppError::DuplicateIdentity(format!("A user with the username '{}' is already registered", username))
}
