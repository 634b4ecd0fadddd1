//! Campground listing handlers.
//!
//! Edit, update and delete sit behind `require_auth` and
//! `require_listing_owner`, so they receive the already loaded listing as
//! an `Extension` and never re-check ownership themselves.

use crate::blob;
use crate::db::models::{ImageRef, Listing};
use crate::db::{listings, reviews};
use crate::error::AppResult;
use crate::forms::{ListingForm, ListingSubmission, ReviewForm};
use crate::session::{self, CurrentUser, PageContext};
use crate::state::AppState;
use crate::validation::{self, ValidationErrors};
use crate::views;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Extension,
};
use tower_sessions::Session;

pub async fn index(State(state): State<AppState>, page: PageContext) -> AppResult<Html<String>> {
    let all = listings::list_listings(&state.db).await?;
    Ok(views::listings::index(&page, &all))
}

pub async fn new_form(page: PageContext) -> Html<String> {
    views::listings::new_form(&page, &ListingForm::default(), None)
}

/// Create a listing owned by the signed-in user.
///
/// ## Flow
/// 1. Validate the text fields and uploads together
/// 2. Store the uploads (all or nothing)
/// 3. Insert the listing; on failure the stored uploads are removed again
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Extension(user): Extension<CurrentUser>,
    multipart: Multipart,
) -> AppResult<Response> {
    let submission = ListingSubmission::from_multipart(multipart).await?;

    let fields = match validation::validate_listing_submission(&submission.form, &submission.uploads) {
        Ok(fields) => fields,
        Err(errors) => {
            let page = PageContext::load(&session).await?;
            let html = views::listings::new_form(&page, &submission.form, Some(&errors));
            return Ok((StatusCode::BAD_REQUEST, html).into_response());
        }
    };

    let images = blob::store_all(state.blobs.as_ref(), submission.uploads).await?;

    let created = listings::create_listing(&state.db, &fields, &user.id, &images).await;
    let listing = match created {
        Ok(listing) => listing,
        Err(e) => {
            blob::discard(state.blobs.as_ref(), image_keys(images)).await;
            return Err(e);
        }
    };
    tracing::info!(listing_id = %listing.id, author_id = %user.id, "Created listing");

    session::flash_success(&session, "Successfully made a new campground!").await?;
    Ok(Redirect::to(&format!("/campgrounds/{}", listing.id)).into_response())
}

pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    Path(id): Path<String>,
) -> AppResult<Html<String>> {
    let listing = listings::get_listing(&state.db, &id).await?;
    let listing_reviews = reviews::reviews_for_listing(&state.db, &id).await?;

    Ok(views::listings::show(&page, &listing, &listing_reviews, &ReviewForm::default(), None))
}

pub async fn edit_form(page: PageContext, Extension(listing): Extension<Listing>) -> Html<String> {
    views::listings::edit_form(&page, &listing, &ListingForm::from(&listing), None)
}

/// Overwrite the listing, add new photos and drop the ones ticked for deletion.
///
/// Only keys that actually belong to this listing are removed from the
/// blob store, and only after the row update succeeded.
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Extension(listing): Extension<Listing>,
    multipart: Multipart,
) -> AppResult<Response> {
    let submission = ListingSubmission::from_multipart(multipart).await?;

    let fields = match validation::validate_listing_submission(&submission.form, &submission.uploads) {
        Ok(fields) => fields,
        Err(errors) => return rerender_edit(&session, &listing, &submission.form, errors).await,
    };

    let remove_keys: Vec<String> = submission
        .delete_images
        .into_iter()
        .filter(|key| listing.images.iter().any(|image| &image.key == key))
        .collect();

    let new_images = blob::store_all(state.blobs.as_ref(), submission.uploads).await?;

    let result = listings::update_listing(&state.db, &listing.id, &fields, &new_images, &remove_keys).await;
    let updated = match result {
        Ok(updated) => updated,
        Err(e) => {
            blob::discard(state.blobs.as_ref(), image_keys(new_images)).await;
            return Err(e);
        }
    };

    let (added, removed) = (new_images.len(), remove_keys.len());
    blob::discard(state.blobs.as_ref(), remove_keys).await;
    tracing::info!(listing_id = %updated.id, added, removed, "Updated listing");

    session::flash_success(&session, "Successfully updated campground!").await?;
    Ok(Redirect::to(&format!("/campgrounds/{}", updated.id)).into_response())
}

async fn rerender_edit(
    session: &Session,
    listing: &Listing,
    form: &ListingForm,
    errors: ValidationErrors,
) -> AppResult<Response> {
    let page = PageContext::load(session).await?;
    let html = views::listings::edit_form(&page, listing, form, Some(&errors));
    Ok((StatusCode::BAD_REQUEST, html).into_response())
}

/// Delete the listing with its reviews and photos.
///
/// A failed review cleanup is logged; the listing itself is already gone,
/// so the user still sees the delete as successful.
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Extension(listing): Extension<Listing>,
) -> AppResult<Redirect> {
    let deleted = listings::delete_listing_and_reviews(&state.db, &listing.id).await?;

    match deleted.cascade {
        Ok(count) => tracing::info!(listing_id = %listing.id, reviews = count, "Deleted listing"),
        Err(e) => tracing::error!(listing_id = %listing.id, error = ?e, "Deleted listing but not its reviews"),
    }

    blob::discard(state.blobs.as_ref(), image_keys(deleted.listing.images)).await;

    session::flash_success(&session, "Successfully deleted campground").await?;
    Ok(Redirect::to("/campgrounds"))
}

fn image_keys(images: Vec<ImageRef>) -> Vec<String> {
    images.into_iter().map(|image| image.key).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send>(_: T) {}

    // Compile-time only: axum rejects handlers whose futures are not `Send`.
    #[allow(dead_code)]
    fn handler_futures_are_send(
        state: AppState,
        session: Session,
        user: CurrentUser,
        listing: Listing,
        create_form: Multipart,
        update_form: Multipart,
    ) {
        assert_send(index(State(state.clone()), PageContext::default()));
        assert_send(create(State(state.clone()), session.clone(), Extension(user), create_form));
        assert_send(show(State(state.clone()), PageContext::default(), Path(listing.id.clone())));
        assert_send(edit_form(PageContext::default(), Extension(listing.clone())));
        assert_send(update(State(state.clone()), session.clone(), Extension(listing.clone()), update_form));
        assert_send(delete(State(state), session, Extension(listing)));
    }
}
