//! # Account Registration
//!
//! Creates a user from an already validated registration form.

use crate::accounts::password;
use crate::db::models::User;
use crate::db::users;
use crate::error::AppResult;
use crate::forms::RegisterForm;
use sqlx::SqlitePool;

/// Register a new account
///
/// ## Flow
/// 1. Check if username is available (fail fast before paying for a hash)
/// 2. Hash the password with a fresh salt
/// 3. Insert the user; the unique index catches a concurrent registration
///
/// ## Errors
/// - DuplicateIdentity: Username already taken (no row is written)
/// - Database / Internal: storage or hashing failed
pub async fn register(pool: &SqlitePool, form: &RegisterForm) -> AppResult<User> {
    let username = form.username.trim();

    if users::find_optional_by_username(pool, username).await?.is_some() {
        return Err(users::duplicate_username(username));
    }

    let hash = password::hash_password(form.password.clone()).await?;

    let user = users::create_user(pool, username, form.email.trim(), &hash).await?;
    tracing::info!(user_id = %user.id, username = %user.username, "Registered new user");

    Ok(user)
}
