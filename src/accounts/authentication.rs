use crate::accounts::password;
use crate::db::models::User;
use crate::db::users;
use crate::error::{AppError, AppResult};
use sqlx::SqlitePool;

/// Check a username/password pair.
///
/// Unknown username and wrong password both come back as
/// `AppError::AuthFailure`, after the same amount of hashing work.
pub async fn authenticate(pool: &SqlitePool, username: &str, password: &str) -> AppResult<User> {
    let user = users::find_optional_by_username(pool, username.trim()).await?;

    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let valid = password::verify_password(password.to_string(), stored_hash).await?;

    match user {
        Some(user) if valid => {
            tracing::debug!(user_id = %user.id, "Credentials accepted");
            Ok(user)
        }
        _ => {
            tracing::debug!("Credentials rejected");
            Err(AppError::AuthFailure)
        }
    }
}
