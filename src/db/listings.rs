//! # Listing Store
//!
//! CRUD for campground listings, plus the one and only way to delete a
//! listing: [`delete_listing_and_reviews`].
//!
//! ## Cascade delete
//! A listing owns its reviews. Deleting it is two explicit steps:
//! 1. delete the listing row (after reading it, so the caller gets it back)
//! 2. bulk-delete every review in its `review_ids`, plus any review that
//!    still points at it through `listing_id`
//!
//! Step 2 is not rolled into step 1's statement. If it fails, the listing
//! stays deleted and the failure is handed back in [`DeletedListing::cascade`]
//! for the caller to log.

use crate::db::models::{ImageRef, Listing, ListingFields};
use crate::error::{not_found_or_db, AppError, AppResult};
use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

pub const LISTING_NOT_FOUND: &str = "Cannot find that campground!";

const SELECT_LISTING: &str = "SELECT l.id, l.title, l.description, l.price, l.location,
        l.longitude, l.latitude, l.images, l.review_ids, l.author_id,
        u.username AS author_username, l.created_at, l.updated_at
     FROM listings l
     JOIN users u ON u.id = l.author_id";

/// Result of [`delete_listing_and_reviews`].
#[derive(Debug)]
pub struct DeletedListing {
    /// The listing as it was just before deletion
    pub listing: Listing,

    /// Number of reviews removed, or why the review cleanup failed
    pub cascade: Result<u64, AppError>,
}

pub async fn create_listing(
    pool: &SqlitePool,
    fields: &ListingFields,
    author_id: &str,
    images: &[ImageRef],
) -> AppResult<Listing> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO listings
         (id, title, description, price, location, longitude, latitude, images, review_ids,
          author_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, '[]', ?, ?, ?)",
    )
    .bind(&id)
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(fields.price)
    .bind(&fields.location)
    .bind(fields.longitude)
    .bind(fields.latitude)
    .bind(Json(images.to_vec()))
    .bind(author_id)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    get_listing(pool, &id).await
}

pub async fn find_listing(pool: &SqlitePool, id: &str) -> AppResult<Option<Listing>> {
    let listing = sqlx::query_as::<_, Listing>(&format!("{SELECT_LISTING} WHERE l.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(listing)
}

pub async fn get_listing(pool: &SqlitePool, id: &str) -> AppResult<Listing> {
    sqlx::query_as::<_, Listing>(&format!("{SELECT_LISTING} WHERE l.id = ?"))
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(|e| not_found_or_db(e, || LISTING_NOT_FOUND.to_string()))
}

/// All listings, oldest first.
pub async fn list_listings(pool: &SqlitePool) -> AppResult<Vec<Listing>> {
    let listings = sqlx::query_as::<_, Listing>(&format!("{SELECT_LISTING} ORDER BY l.rowid"))
        .fetch_all(pool)
        .await?;

    Ok(listings)
}

/// Overwrite the editable fields and reconcile the image sequence.
///
/// Images whose key is in `remove_keys` are pruned and `new_images` are
/// appended, in the same row update. The author is never touched.
pub async fn update_listing(
    pool: &SqlitePool,
    id: &str,
    fields: &ListingFields,
    new_images: &[ImageRef],
    remove_keys: &[String],
) -> AppResult<Listing> {
    let mut tx = pool.begin().await?;

    let (Json(current),): (Json<Vec<ImageRef>>,) =
        sqlx::query_as("SELECT images FROM listings WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| not_found_or_db(e, || LISTING_NOT_FOUND.to_string()))?;

    let images: Vec<ImageRef> = current
        .into_iter()
        .filter(|image| !remove_keys.contains(&image.key))
        .chain(new_images.iter().cloned())
        .collect();

    sqlx::query(
        "UPDATE listings
         SET title = ?, description = ?, price = ?, location = ?, longitude = ?, latitude = ?,
             images = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(fields.price)
    .bind(&fields.location)
    .bind(fields.longitude)
    .bind(fields.latitude)
    .bind(Json(images))
    .bind(Utc::now().to_rfc3339())
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    get_listing(pool, id).await
}

/// Delete a listing and then every review that belongs to it.
///
/// This is the only listing delete path in the crate.
pub async fn delete_listing_and_reviews(pool: &SqlitePool, id: &str) -> AppResult<DeletedListing> {
    let listing = get_listing(pool, id).await?;

    let deleted = sqlx::query("DELETE FROM listings WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    // Someone else got there first; their call ran the cascade.
    if deleted == 0 {
        return Err(AppError::NotFound(LISTING_NOT_FOUND.to_string()));
    }

    let cascade = delete_reviews_of(pool, &listing).await;

    Ok(DeletedListing { listing, cascade })
}

async fn delete_reviews_of(pool: &SqlitePool, listing: &Listing) -> Result<u64, AppError> {
    // Covers reviews in the sequence and any whose append lost a race.
    let result = sqlx::query(
        "DELETE FROM reviews
         WHERE listing_id = ?1
            OR id IN (SELECT value FROM json_each(?2))",
    )
    .bind(listing.id.clone())
    .bind(Json(listing.review_ids.clone()))
    .execute(pool)
    .await
    .map_err(|source| AppError::CascadeFailure {
        listing_id: listing.id.clone(),
        source,
    })?;

    Ok(result.rows_affected())
}
