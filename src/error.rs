//! # Error Handling
//!
//! This module defines the application error type and the single place
//! where failures are turned into HTTP responses.
//!
//! ## Error categories
//! - Store and collaborator failures (database, session store, blob store)
//!   are logged in full and shown to the user as a generic error page.
//! - `NotFound`, `BadRequest` and friends carry a message that is safe to
//!   show.
//! - Validation failures never reach this module: handlers re-render the
//!   form with field errors instead.
//! - "Sign in first" and "no permission" are redirects produced by the
//!   middleware, not errors.

use crate::blob::BlobError;
use crate::views;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Message shown for the authentication failure, whichever half was wrong.
pub const AUTH_FAILURE_MESSAGE: &str = "Password or username is incorrect";

/// Application-wide error type
///
/// The `#[from]` attributes let store code use `?` on sqlx, session and
/// blob store results directly.
#[derive(Error, Debug)]
pub enum AppError {
    /// Database errors (SQLx library errors)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Session store errors
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Image storage is unreachable or refused the operation
    #[error("Blob store error: {0}")]
    Blob(#[from] BlobError),

    /// Resource not found errors (404)
    #[error("{0}")]
    NotFound(String),

    /// A user with this username already exists (409)
    #[error("{0}")]
    DuplicateIdentity(String),

    /// Wrong username or wrong password; deliberately indistinguishable
    #[error("{}", AUTH_FAILURE_MESSAGE)]
    AuthFailure,

    /// Malformed request the user can fix (400)
    #[error("{0}")]
    BadRequest(String),

    /// A listing was deleted but its reviews could not be removed
    #[error("Reviews of listing {listing_id} were not deleted: {source}")]
    CascadeFailure {
        listing_id: String,
        #[source]
        source: sqlx::Error,
    },

    /// Internal server errors (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_)
            | AppError::Session(_)
            | AppError::CascadeFailure { .. }
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Blob(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateIdentity(_) => StatusCode::CONFLICT,
            AppError::AuthFailure => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Text that is safe to put in front of the user.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Database(_)
            | AppError::Session(_)
            | AppError::CascadeFailure { .. }
            | AppError::Internal(_) => "Something went wrong".to_string(),
            AppError::Blob(_) => "Image storage is unavailable, please try again later".to_string(),
            AppError::NotFound(_)
            | AppError::DuplicateIdentity(_)
            | AppError::AuthFailure
            | AppError::BadRequest(_) => self.to_string(),
        }
    }
}

/// Convert AppError into an HTTP response
///
/// Every handler returns `AppResult<_>`, so this is the terminal stage for
/// all failures: log the detail, pick the status, render the error view.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            // Full detail for the operator, never for the user
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        (status, views::errors::error_page(status, &self.public_message())).into_response()
    }
}

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Map `RowNotFound` to a user-facing 404, everything else to a database error.
pub fn not_found_or_db(e: sqlx::Error, what: impl FnOnce() -> String) -> AppError {
    match e {
        sqlx::Error::RowNotFound => AppError::NotFound(what()),
        _ => AppError::Database(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::NotFound("Cannot find that campground!".into()), StatusCode::NOT_FOUND)]
    #[case(AppError::BadRequest("bad".into()), StatusCode::BAD_REQUEST)]
    #[case(AppError::DuplicateIdentity("taken".into()), StatusCode::CONFLICT)]
    #[case(AppError::AuthFailure, StatusCode::UNAUTHORIZED)]
    #[case(AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(AppError::Blob(BlobError::Unavailable("down".into())), StatusCode::BAD_GATEWAY)]
    fn status_follows_variant(#[case] error: AppError, #[case] expected: StatusCode) {
        assert_eq!(error.status(), expected);
    }

    #[tokio::test]
    async fn internal_details_are_not_rendered() {
        let response = AppError::Internal("secret table name".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("Something went wrong"));
        assert!(!html.contains("secret table name"));
    }

    #[tokio::test]
    async fn not_found_message_is_rendered() {
        let response = AppError::NotFound("Page Not Found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("Page Not Found"));
    }

    #[test]
    fn auth_failure_has_constant_message() {
        assert_eq!(AppError::AuthFailure.to_string(), AUTH_FAILURE_MESSAGE);
    }
}
