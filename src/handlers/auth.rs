use crate::accounts::{authentication, registration};
use crate::error::{AppError, AppResult, AUTH_FAILURE_MESSAGE};
use crate::forms::{LoginForm, RegisterForm};
use crate::session::{self, PageContext, DEFAULT_RETURN_TO};
use crate::state::AppState;
use crate::validation::{self, ValidationErrors};
use crate::views;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use tower_sessions::Session;

// Registration

pub async fn register_form(page: PageContext) -> Html<String> {
    views::users::register_form(&page, &RegisterForm::default(), None)
}

/// Create the account and sign it in straight away.
///
/// Invalid input re-renders the form (400); a taken username re-renders it
/// with the error on the username field (409).
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    if let Err(errors) = validation::validate_registration(&form) {
        return rerender_registration(&session, StatusCode::BAD_REQUEST, &form, errors).await;
    }

    let user = match registration::register(&state.db, &form).await {
        Ok(user) => user,
        Err(AppError::DuplicateIdentity(message)) => {
            let mut errors = ValidationErrors::default();
            errors.push("username", message);
            return rerender_registration(&session, StatusCode::CONFLICT, &form, errors).await;
        }
        Err(e) => return Err(e),
    };

    session::log_in(&session, &user).await?;
    session::flash_success(&session, "Welcome to Yelp Camp!").await?;

    Ok(Redirect::to(DEFAULT_RETURN_TO).into_response())
}

async fn rerender_registration(
    session: &Session,
    status: StatusCode,
    form: &RegisterForm,
    errors: ValidationErrors,
) -> AppResult<Response> {
    let page = PageContext::load(session).await?;
    Ok((status, views::users::register_form(&page, form, Some(&errors))).into_response())
}

// Login / logout

pub async fn login_form(page: PageContext) -> Html<String> {
    views::users::login_form(&page, &LoginForm::default())
}

/// Sign in and go back to wherever the sign-in prompt interrupted.
///
/// A failed attempt flashes one message for both wrong username and wrong
/// password, then shows the form again.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let user = match authentication::authenticate(&state.db, &form.username, &form.password).await {
        Ok(user) => user,
        Err(AppError::AuthFailure) => {
            session::flash_error(&session, AUTH_FAILURE_MESSAGE).await?;
            return Ok(Redirect::to("/login").into_response());
        }
        Err(e) => return Err(e),
    };

    // Read before log_in cycles the session id; the data carries over either way.
    let return_to = session::take_return_to(&session).await?;

    session::log_in(&session, &user).await?;
    session::flash_success(&session, "welcome back!").await?;
    tracing::info!(user_id = %user.id, "User signed in");

    Ok(Redirect::to(&return_to).into_response())
}

pub async fn logout(session: Session) -> AppResult<Redirect> {
    session::log_out(&session).await?;
    session::flash_success(&session, "Goodbye!").await?;

    Ok(Redirect::to(DEFAULT_RETURN_TO))
}
