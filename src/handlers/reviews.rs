use crate::db::models::Review;
use crate::db::{listings, reviews};
use crate::error::AppResult;
use crate::forms::ReviewForm;
use crate::session::{self, CurrentUser, PageContext};
use crate::state::AppState;
use crate::validation;
use crate::views;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use tower_sessions::Session;

/// Add a review to a listing. Any signed-in user may review any listing.
///
/// An invalid review re-renders the listing page with the errors next to
/// the review form.
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Extension(user): Extension<CurrentUser>,
    Path(listing_id): Path<String>,
    Form(form): Form<ReviewForm>,
) -> AppResult<Response> {
    let fields = match validation::validate_review(&form) {
        Ok(fields) => fields,
        Err(errors) => {
            let listing = listings::get_listing(&state.db, &listing_id).await?;
            let existing = reviews::reviews_for_listing(&state.db, &listing_id).await?;
            let page = PageContext::load(&session).await?;
            let html = views::listings::show(&page, &listing, &existing, &form, Some(&errors));
            return Ok((StatusCode::BAD_REQUEST, html).into_response());
        }
    };

    let review = reviews::create_review(&state.db, &listing_id, &fields, &user.id).await?;
    tracing::info!(review_id = %review.id, listing_id = %listing_id, "Created review");

    session::flash_success(&session, "Created new review!").await?;
    Ok(Redirect::to(&format!("/campgrounds/{listing_id}")).into_response())
}

/// Remove a review. Reached only through `require_review_owner`.
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Extension(review): Extension<Review>,
) -> AppResult<Redirect> {
    reviews::delete_review(&state.db, &review.listing_id, &review.id).await?;
    tracing::info!(review_id = %review.id, listing_id = %review.listing_id, "Deleted review");

    session::flash_success(&session, "Successfully deleted review").await?;
    Ok(Redirect::to(&format!("/campgrounds/{}", review.listing_id)))
}
