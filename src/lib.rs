//! # Campground Server
//!
//! A campground listing site: users register and sign in with a password,
//! post campgrounds with photos, and review each other's campgrounds.
//!
//! ## Key Concepts
//! - **Ownership**: only the author of a listing or review may change it;
//!   the check is middleware, not handler code
//! - **Cascade delete**: deleting a listing deletes its reviews
//!   ([`db::listings::delete_listing_and_reviews`])
//! - **Sessions**: server-side state in SQLite, a signed id cookie in the
//!   browser, one-shot flash messages

pub mod accounts;    // Password hashing, registration, sign-in
pub mod blob;        // Image storage behind a trait
pub mod config;      // Configuration management (environment variables, settings)
pub mod db;          // Database operations (users, listings, reviews)
pub mod error;       // Error handling and custom error types
pub mod forms;       // Raw form submissions
pub mod handlers;    // HTTP request handlers
pub mod middleware;  // Auth, ownership and method-override layers
pub mod routes;      // Router assembly
pub mod seed;        // Sample data for development
pub mod session;     // Signed-in user, flash messages, return-to
pub mod state;       // Shared application state
pub mod validation;  // Input checks for every create/update path
pub mod views;       // HTML rendering

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
