//! # Review Store
//!
//! A review row and its id in the parent listing's `review_ids` are
//! written together in one transaction, so the two sides never disagree
//! after a call returns. Append and pull are single `UPDATE` statements
//! using SQLite's JSON functions: two concurrent appends both land.

use crate::db::listings::LISTING_NOT_FOUND;
use crate::db::models::{Review, ReviewFields};
use crate::error::{not_found_or_db, AppError, AppResult};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

pub const REVIEW_NOT_FOUND: &str = "Cannot find that review!";

const SELECT_REVIEW: &str = "SELECT r.id, r.listing_id, r.author_id, u.username AS author_username,
        r.body, r.rating, r.created_at
     FROM reviews r
     JOIN users u ON u.id = r.author_id";

/// Create a review on `listing_id` and append it to the listing's sequence.
pub async fn create_review(
    pool: &SqlitePool,
    listing_id: &str,
    fields: &ReviewFields,
    author_id: &str,
) -> AppResult<Review> {
    let id = Uuid::new_v4().to_string();
    let mut tx = pool.begin().await?;

    // Append first: this takes the write lock and tells us whether the listing exists.
    let appended = sqlx::query(
        "UPDATE listings SET review_ids = json_insert(review_ids, '$[#]', ?) WHERE id = ?",
    )
    .bind(&id)
    .bind(listing_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if appended == 0 {
        return Err(AppError::NotFound(LISTING_NOT_FOUND.to_string()));
    }

    sqlx::query(
        "INSERT INTO reviews (id, listing_id, author_id, body, rating, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(listing_id)
    .bind(author_id)
    .bind(&fields.body)
    .bind(fields.rating)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    get_review(pool, &id).await
}

pub async fn get_review(pool: &SqlitePool, review_id: &str) -> AppResult<Review> {
    sqlx::query_as::<_, Review>(&format!("{SELECT_REVIEW} WHERE r.id = ?"))
        .bind(review_id)
        .fetch_one(pool)
        .await
        .map_err(|e| not_found_or_db(e, || REVIEW_NOT_FOUND.to_string()))
}

/// Look a review up by id, but only if it belongs to `listing_id`.
pub async fn find_review_on_listing(
    pool: &SqlitePool,
    listing_id: &str,
    review_id: &str,
) -> AppResult<Option<Review>> {
    let review = sqlx::query_as::<_, Review>(&format!(
        "{SELECT_REVIEW} WHERE r.id = ? AND r.listing_id = ?"
    ))
    .bind(review_id)
    .bind(listing_id)
    .fetch_optional(pool)
    .await?;

    Ok(review)
}

/// Reviews of a listing, in the order of its `review_ids`.
pub async fn reviews_for_listing(pool: &SqlitePool, listing_id: &str) -> AppResult<Vec<Review>> {
    let reviews = sqlx::query_as::<_, Review>(
        "SELECT r.id, r.listing_id, r.author_id, u.username AS author_username,
                r.body, r.rating, r.created_at
         FROM listings l, json_each(l.review_ids) AS seq
         JOIN reviews r ON r.id = seq.value
         JOIN users u ON u.id = r.author_id
         WHERE l.id = ?
         ORDER BY seq.key",
    )
    .bind(listing_id)
    .fetch_all(pool)
    .await?;

    Ok(reviews)
}

/// Delete a review and pull its id out of the listing's sequence.
pub async fn delete_review(pool: &SqlitePool, listing_id: &str, review_id: &str) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE listings
         SET review_ids = (
             SELECT json_group_array(value)
             FROM (SELECT value FROM json_each(listings.review_ids) WHERE value <> ?1 ORDER BY key)
         )
         WHERE id = ?2",
    )
    .bind(review_id)
    .bind(listing_id)
    .execute(&mut *tx)
    .await?;

    let deleted = sqlx::query("DELETE FROM reviews WHERE id = ? AND listing_id = ?")
        .bind(review_id)
        .bind(listing_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if deleted == 0 {
        // Dropping `tx` rolls the pull back.
        return Err(AppError::NotFound(REVIEW_NOT_FOUND.to_string()));
    }

    tx.commit().await?;
    Ok(())
}

/// Number of review rows whose `listing_id` is `listing_id`.
#[cfg(any(test, feature = "test-support"))]
pub async fn count_for_listing(pool: &SqlitePool, listing_id: &str) -> AppResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reviews WHERE listing_id = ?")
        .bind(listing_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{listings, users};
    use crate::test_support::{listing_fields, memory_pool};

    async fn setup(pool: &SqlitePool) -> (String, String) {
        let alice = users::create_user(pool, "alice", "a@example.com", "h").await.unwrap();
        let listing = listings::create_listing(pool, &listing_fields("Ridge View", 25.0), &alice.id, &[])
            .await
            .unwrap();
        (alice.id, listing.id)
    }

    fn fields(body: &str, rating: i64) -> ReviewFields {
        ReviewFields {
            body: body.to_string(),
            rating,
        }
    }

    #[tokio::test]
    async fn created_review_is_immediately_in_listing_sequence() {
        let pool = memory_pool().await;
        let (author, listing_id) = setup(&pool).await;

        let review = create_review(&pool, &listing_id, &fields("Great views", 5), &author)
            .await
            .unwrap();

        let listing = listings::get_listing(&pool, &listing_id).await.unwrap();
        assert_eq!(listing.review_ids, vec![review.id.clone()]);
        assert_eq!(review.listing_id, listing_id);
        assert_eq!(review.author_username, "alice");
    }

    #[tokio::test]
    async fn reviews_follow_sequence_order() {
        let pool = memory_pool().await;
        let (author, listing_id) = setup(&pool).await;

        let first = create_review(&pool, &listing_id, &fields("first", 3), &author).await.unwrap();
        let second = create_review(&pool, &listing_id, &fields("second", 4), &author).await.unwrap();

        let ids: Vec<String> = reviews_for_listing(&pool, &listing_id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn review_on_missing_listing_is_not_found_and_writes_nothing() {
        let pool = memory_pool().await;
        let (author, _) = setup(&pool).await;

        let err = create_review(&pool, "missing", &fields("hmm", 2), &author).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(count_for_listing(&pool, "missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_pulls_id_from_sequence() {
        let pool = memory_pool().await;
        let (author, listing_id) = setup(&pool).await;
        let keep = create_review(&pool, &listing_id, &fields("keep", 4), &author).await.unwrap();
        let dropped = create_review(&pool, &listing_id, &fields("drop", 1), &author).await.unwrap();

        delete_review(&pool, &listing_id, &dropped.id).await.unwrap();

        let listing = listings::get_listing(&pool, &listing_id).await.unwrap();
        assert_eq!(listing.review_ids, vec![keep.id]);
        assert!(matches!(get_review(&pool, &dropped.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn deleting_last_review_leaves_empty_sequence() {
        let pool = memory_pool().await;
        let (author, listing_id) = setup(&pool).await;
        let only = create_review(&pool, &listing_id, &fields("only", 4), &author).await.unwrap();

        delete_review(&pool, &listing_id, &only.id).await.unwrap();

        let listing = listings::get_listing(&pool, &listing_id).await.unwrap();
        assert!(listing.review_ids.is_empty());
    }

    #[tokio::test]
    async fn delete_through_wrong_listing_is_not_found_and_keeps_sequence() {
        let pool = memory_pool().await;
        let (author, listing_id) = setup(&pool).await;
        let other = listings::create_listing(&pool, &listing_fields("Other", 5.0), &author, &[])
            .await
            .unwrap();
        let review = create_review(&pool, &listing_id, &fields("stay", 4), &author).await.unwrap();

        let err = delete_review(&pool, &other.id, &review.id).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        let listing = listings::get_listing(&pool, &listing_id).await.unwrap();
        assert_eq!(listing.review_ids, vec![review.id]);
    }

    #[tokio::test]
    async fn find_on_listing_checks_the_parent() {
        let pool = memory_pool().await;
        let (author, listing_id) = setup(&pool).await;
        let review = create_review(&pool, &listing_id, &fields("here", 4), &author).await.unwrap();

        assert!(find_review_on_listing(&pool, &listing_id, &review.id).await.unwrap().is_some());
        assert!(find_review_on_listing(&pool, "elsewhere", &review.id).await.unwrap().is_none());
    }
}
