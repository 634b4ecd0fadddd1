//! # Database Module
//!
//! This module organizes all database-related code into submodules:
//! - `models`: Data structures (User, Listing, Review)
//! - `users`: User store (registration rows, lookups)
//! - `listings`: Listing store, including the cascade-aware delete
//! - `reviews`: Review store (writes both the review and its listing's sequence)
//!
//! Schema lives in `migrations/` and is applied at startup by
//! [`crate::state::AppState::new`].

pub mod listings;
pub mod models;
pub mod reviews;
pub mod users;
