//! # Session & Flash Layer
//!
//! Everything the app keeps in the session lives behind this module:
//! - the signed-in user (`user`)
//! - one-shot flash messages shown on the next rendered page (`flash`)
//! - the path to return to after signing in (`return_to`)
//!
//! Session data is stored server-side by `tower-sessions`; the browser only
//! holds a signed session id cookie.

use crate::config::{Config, MIN_SESSION_SECRET_LEN};
use crate::db::models::User;
use crate::error::{AppError, AppResult};
use anyhow::Context;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use tower_sessions::cookie::Key;
use tower_sessions::Session;

const USER_KEY: &str = "user";
const FLASH_KEY: &str = "flash";
const RETURN_TO_KEY: &str = "return_to";

/// Where users land after signing in when nothing else was requested.
pub const DEFAULT_RETURN_TO: &str = "/campgrounds";

/// Identity of the signed-in user, as stored in the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

/// Cookie and expiry settings for the session layer
#[derive(Clone)]
pub struct SessionSettings {
    /// Signing key for the session id cookie
    pub key: Key,
    /// Inactivity window
    pub ttl: time::Duration,
    /// Send the cookie over HTTPS only
    pub secure: bool,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let key = match &config.session_secret {
            Some(secret) => Key::try_from(secret.as_slice())
                .with_context(|| format!("SESSION_SECRET must be at least {MIN_SESSION_SECRET_LEN} bytes"))?,
            None => {
                tracing::warn!("SESSION_SECRET not set; sessions will not survive a restart");
                Key::generate()
            }
        };

        Ok(Self {
            key,
            ttl: time::Duration::hours(config.session_ttl_hours),
            secure: config.cookie_secure,
        })
    }
}

pub async fn current_user(session: &Session) -> AppResult<Option<CurrentUser>> {
    Ok(session.get::<CurrentUser>(USER_KEY).await?)
}

/// Establish `user` as the session identity.
///
/// The session id is cycled first so an id issued before login can't be reused.
pub async fn log_in(session: &Session, user: &User) -> AppResult<()> {
    session.cycle_id().await?;
    session.insert(USER_KEY, CurrentUser::from(user)).await?;
    Ok(())
}

pub async fn log_out(session: &Session) -> AppResult<()> {
    session.remove::<CurrentUser>(USER_KEY).await?;
    session.remove::<String>(RETURN_TO_KEY).await?;
    session.cycle_id().await?;
    Ok(())
}

pub async fn flash(session: &Session, kind: FlashKind, message: impl Into<String>) -> AppResult<()> {
    let mut pending: Vec<Flash> = session.get(FLASH_KEY).await?.unwrap_or_default();
    pending.push(Flash {
        kind,
        message: message.into(),
    });
    session.insert(FLASH_KEY, pending).await?;
    Ok(())
}

pub async fn flash_success(session: &Session, message: impl Into<String>) -> AppResult<()> {
    flash(session, FlashKind::Success, message).await
}

pub async fn flash_error(session: &Session, message: impl Into<String>) -> AppResult<()> {
    flash(session, FlashKind::Error, message).await
}

/// Remove and return the pending flash messages.
pub async fn take_flashes(session: &Session) -> AppResult<Vec<Flash>> {
    Ok(session.remove::<Vec<Flash>>(FLASH_KEY).await?.unwrap_or_default())
}

pub async fn set_return_to(session: &Session, path: &str) -> AppResult<()> {
    if is_local_path(path) {
        session.insert(RETURN_TO_KEY, path).await?;
    }
    Ok(())
}

/// Remove the recorded path, falling back to [`DEFAULT_RETURN_TO`].
pub async fn take_return_to(session: &Session) -> AppResult<String> {
    let path = session
        .remove::<String>(RETURN_TO_KEY)
        .await?
        .filter(|p| is_local_path(p))
        .unwrap_or_else(|| DEFAULT_RETURN_TO.to_string());
    Ok(path)
}

/// Only same-site absolute paths; `//host` would be an open redirect.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
}

/// Per-request data every page layout needs: who is signed in and
/// which flash messages to show. Loading it consumes the flashes.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub flashes: Vec<Flash>,
}

impl PageContext {
    pub async fn load(session: &Session) -> AppResult<Self> {
        Ok(Self {
            user: current_user(session).await?,
            flashes: take_flashes(session).await?,
        })
    }

    pub fn is_author(&self, author_id: &str) -> bool {
        self.user.as_ref().is_some_and(|u| u.id == author_id)
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Internal(format!("Session unavailable: {msg}")))?;
        Self::load(&session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn flashes_are_consumed_once() {
        let session = session();
        flash_success(&session, "Created new review!").await.unwrap();
        flash_error(&session, "Oops").await.unwrap();

        let first = take_flashes(&session).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].kind, FlashKind::Success);
        assert_eq!(first[1].message, "Oops");

        assert!(take_flashes(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn log_in_and_out_round_trip_the_identity() {
        let session = session();
        let user = User::new("alice".into(), "a@example.com".into(), "hash".into());

        log_in(&session, &user).await.unwrap();
        let current = current_user(&session).await.unwrap().unwrap();
        assert_eq!(current.id, user.id);
        assert_eq!(current.username, "alice");

        log_out(&session).await.unwrap();
        assert!(current_user(&session).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn return_to_defaults_and_rejects_foreign_hosts() {
        let session = session();
        assert_eq!(take_return_to(&session).await.unwrap(), DEFAULT_RETURN_TO);

        set_return_to(&session, "//evil.example.com").await.unwrap();
        assert_eq!(take_return_to(&session).await.unwrap(), DEFAULT_RETURN_TO);

        set_return_to(&session, "/campgrounds/new").await.unwrap();
        assert_eq!(take_return_to(&session).await.unwrap(), "/campgrounds/new");
        // Consumed.
        assert_eq!(take_return_to(&session).await.unwrap(), DEFAULT_RETURN_TO);
    }

    #[tokio::test]
    async fn page_context_checks_authorship() {
        let session = session();
        let user = User::new("alice".into(), "a@example.com".into(), "hash".into());
        log_in(&session, &user).await.unwrap();

        let page = PageContext::load(&session).await.unwrap();
        assert!(page.is_author(&user.id));
        assert!(!page.is_author("someone-else"));
        assert!(!PageContext::default().is_author(&user.id));
    }
}
