//! # Database Models
//!
//! This module defines the data structures that map to database tables.
//!
//! ## Key Concepts
//! - **Rows**: `User`, `Listing` and `Review` are read straight from SQLite with `sqlx::FromRow`
//! - **Sequences**: a listing's images and review ids are JSON arrays in a TEXT column,
//!   decoded with `#[sqlx(json)]`
//! - **Fields**: `ListingFields` / `ReviewFields` are the validated, user-editable parts,
//!   produced by `crate::validation` and consumed by the stores

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User account information
///
/// ## Why Strings for dates?
/// SQLite stores timestamps as text (RFC3339 format), same as every other table here.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique identifier (UUID v4)
    pub id: String,

    /// Unique username, used for login
    pub username: String,

    pub email: String,

    /// Argon2id PHC string. The salt is part of the string.
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// When the user account was created (RFC3339 timestamp)
    pub created_at: String,
}

impl User {
    /// Create a new user with generated ID and timestamp
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            password_hash,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Reference to one stored image of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Public URL of the full-size image
    pub url: String,

    /// Blob store key, used to delete the image later
    pub key: String,
}

impl ImageRef {
    /// URL of a 200px-wide rendition.
    ///
    /// Providers that transform on the fly take a `/upload/w_200` path
    /// segment; locally stored files get a width hint the browser ignores.
    pub fn thumbnail(&self) -> String {
        if self.url.contains("/upload/") {
            self.url.replacen("/upload/", "/upload/w_200/", 1)
        } else {
            format!("{}?w=200", self.url)
        }
    }
}

/// A campground listing
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub description: String,

    /// Nightly price; never negative
    pub price: f64,

    /// Human-readable place, e.g. "Denver, CO"
    pub location: String,

    pub longitude: f64,
    pub latitude: f64,

    /// Ordered image references
    #[sqlx(json)]
    pub images: Vec<ImageRef>,

    /// Ordered ids of the reviews that belong to this listing
    #[sqlx(json)]
    pub review_ids: Vec<String>,

    /// Owning user; set at creation, never reassigned
    pub author_id: String,

    /// Joined from `users` for display
    pub author_username: String,

    pub created_at: String,
    pub updated_at: String,
}

impl Listing {
    /// `[longitude, latitude]`, the order map widgets expect
    pub fn coordinates(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// A review left on a listing
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: String,

    /// The listing this review belongs to
    pub listing_id: String,

    pub author_id: String,

    /// Joined from `users` for display
    pub author_username: String,

    pub body: String,

    /// 1 to 5 stars
    pub rating: i64,

    pub created_at: String,
}

/// Validated, user-editable listing fields
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFields {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub location: String,
    pub longitude: f64,
    pub latitude: f64,
}

/// Validated review fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewFields {
    pub body: String,
    pub rating: i64,
}
