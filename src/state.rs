//! # Application State
//!
//! This module defines the shared state that's accessible to all request handlers.
//! In Axum, state is how you share resources (database connections, configuration, etc.)
//! across different parts of your application.
//!
//! ## The State Pattern
//! Instead of creating new database connections for each request, we:
//! 1. Create a connection pool once at startup
//! 2. Store it in AppState
//! 3. Share it across all request handlers
//! 4. Axum clones the state for each request (cheap because we use Arc)

use crate::blob::{BlobStore, LocalBlobStore};
use crate::config::Config;
use anyhow::{Context, Result};
use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;

/// Embedded schema migrations from `./migrations`
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Shared application state
///
/// ## Why Clone?
/// Each request handler gets a clone of the state. This is cheap:
/// - `SqlitePool` is already a clone-able handle to a pool of connections
/// - `Arc<dyn BlobStore>` only clones a pointer
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (users, listings, reviews)
    pub db: SqlitePool,

    /// Where listing images are stored
    pub blobs: Arc<dyn BlobStore>,
}

impl AppState {
    /// Initialize application state
    ///
    /// This function:
    /// 1. Connects to the SQLite database
    /// 2. Runs database migrations (creates tables if they don't exist)
    /// 3. Sets up the local blob store for uploaded images
    ///
    /// # Errors
    /// Returns an error if the database can't be reached or migrated; the
    /// server refuses to start in that case.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = SqlitePool::connect(&config.database_url)
            .await
            .with_context(|| format!("Could not connect to {}", config.database_url))?;

        MIGRATOR.run(&db).await.context("Database migration failed")?;

        let blobs = Arc::new(LocalBlobStore::new(&config.blob_dir, config.blob_base_url.clone()));

        Ok(Self::from_parts(db, blobs))
    }

    /// Assemble state from already constructed collaborators.
    pub fn from_parts(db: SqlitePool, blobs: Arc<dyn BlobStore>) -> Self {
        AppState { db, blobs }
    }
}
