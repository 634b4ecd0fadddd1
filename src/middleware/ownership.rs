//! # Ownership Checks
//!
//! Only the author of a listing may edit or delete it, and only the author
//! of a review may delete it.
//!
//! The decision itself is a plain function returning [`Access`]; the
//! middleware wrappers turn that into "continue", a permission-denied
//! redirect, or a 404. On success the loaded entity is put into the request
//! extensions so the handler doesn't look it up again.
//!
//! These layers expect [`super::auth::require_auth`] to have run first.

use crate::db::models::{Listing, Review};
use crate::db::{listings, reviews};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{signed_in_user, SIGN_IN_REQUIRED};
use crate::session::{self, CurrentUser};
use crate::state::AppState;
use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

pub const PERMISSION_DENIED: &str = "You do not have permission to do that!";

/// Outcome of an ownership check
#[derive(Debug)]
pub enum Access<T> {
    /// The user owns the entity; here it is.
    Authorized(T),
    /// The entity exists and belongs to someone else.
    Denied,
    /// No such entity.
    NotFound,
}

impl<T> Access<T> {
    fn decide(entity: Option<T>, user: &CurrentUser, author_of: impl Fn(&T) -> &str) -> Self {
        match entity {
            None => Access::NotFound,
            Some(e) if author_of(&e) == user.id => Access::Authorized(e),
            Some(_) => Access::Denied,
        }
    }
}

pub async fn check_listing_access(
    pool: &SqlitePool,
    listing_id: &str,
    user: &CurrentUser,
) -> AppResult<Access<Listing>> {
    let listing = listings::find_listing(pool, listing_id).await?;
    Ok(Access::decide(listing, user, |l| l.author_id.as_str()))
}

/// A review only counts as found when it belongs to `listing_id`.
pub async fn check_review_access(
    pool: &SqlitePool,
    listing_id: &str,
    review_id: &str,
    user: &CurrentUser,
) -> AppResult<Access<Review>> {
    let review = reviews::find_review_on_listing(pool, listing_id, review_id).await?;
    Ok(Access::decide(review, user, |r| r.author_id.as_str()))
}

/// Gate for `/campgrounds/{id}` mutations.
pub async fn require_listing_owner(
    State(state): State<AppState>,
    session: Session,
    Path(listing_id): Path<String>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(user) = signed_in_user(&request) else {
        return sign_in_first(&session).await;
    };

    let access = check_listing_access(&state.db, &listing_id, &user).await?;
    enforce(access, &session, &listing_id, request, next, listings::LISTING_NOT_FOUND).await
}

/// Gate for `/campgrounds/{id}/reviews/{review_id}` mutations.
pub async fn require_review_owner(
    State(state): State<AppState>,
    session: Session,
    Path((listing_id, review_id)): Path<(String, String)>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(user) = signed_in_user(&request) else {
        return sign_in_first(&session).await;
    };

    let access = check_review_access(&state.db, &listing_id, &review_id, &user).await?;
    enforce(access, &session, &listing_id, request, next, reviews::REVIEW_NOT_FOUND).await
}

async fn enforce<T>(
    access: Access<T>,
    session: &Session,
    listing_id: &str,
    mut request: Request,
    next: Next,
    not_found: &str,
) -> Result<Response, AppError>
where
    T: Clone + Send + Sync + 'static,
{
    match access {
        Access::Authorized(entity) => {
            request.extensions_mut().insert(entity);
            Ok(next.run(request).await)
        }
        Access::Denied => {
            tracing::info!(listing_id, "Ownership check denied");
            session::flash_error(session, PERMISSION_DENIED).await?;
            Ok(Redirect::to(&format!("/campgrounds/{listing_id}")).into_response())
        }
        Access::NotFound => Err(AppError::NotFound(not_found.to_string())),
    }
}

async fn sign_in_first(session: &Session) -> Result<Response, AppError> {
    session::flash_error(session, SIGN_IN_REQUIRED).await?;
    Ok(Redirect::to("/login").into_response())
}
