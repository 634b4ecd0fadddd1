use crate::error::AppError;
use crate::session::{self, CurrentUser, DEFAULT_RETURN_TO};
use axum::{
    extract::Request,
    http::Method,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

pub const SIGN_IN_REQUIRED: &str = "You must be signed in first!";

/// Let the request through only when the session has a signed-in user.
///
/// The user is put into the request extensions as [`CurrentUser`] for the
/// ownership checks and handlers further in. Anonymous requests are sent to
/// `/login` with a flash, remembering where to go after signing in.
pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match session::current_user(&session).await? {
        Some(user) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        None => {
            // A form submission can't be replayed by a redirect; send those
            // back to the index instead.
            let return_to = if request.method() == Method::GET {
                request
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or(DEFAULT_RETURN_TO)
            } else {
                DEFAULT_RETURN_TO
            };
            session::set_return_to(&session, return_to).await?;
            session::flash_error(&session, SIGN_IN_REQUIRED).await?;
            Ok(Redirect::to("/login").into_response())
        }
    }
}

/// The signed-in user placed by [`require_auth`], if that layer ran.
pub fn signed_in_user(request: &Request) -> Option<CurrentUser> {
    request.extensions().get::<CurrentUser>().cloned()
}
