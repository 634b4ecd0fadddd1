//! # Campground Server
//!
//! Entry point: load configuration, open the database, wire the session
//! store and serve HTTP.

use campground_server::config::Config;
use campground_server::routes::{self, ServeSettings};
use campground_server::state::AppState;
// SQLite-backed session storage
use tower_sessions_sqlx_store::SqliteStore;
// Structured logging setup
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main application entry point
///
/// This function:
/// 1. Sets up logging
/// 2. Loads configuration from environment variables
/// 3. Connects to and migrates the database
/// 4. Creates the session table
/// 5. Builds the router and starts the HTTP server
///
/// Expired sessions are not swept by a background task; `tower-sessions`
/// treats them as absent once their expiry has passed.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default: info level for most crates, debug level for our app
    // Can be overridden with RUST_LOG environment variable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,campground_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded: {:?}", config);

    // Refuses to start if the database is unreachable or can't be migrated
    let app_state = AppState::new(&config).await?;
    tracing::info!("Application state initialized");

    // Session data lives next to the application tables
    let session_store = SqliteStore::new(app_state.db.clone());
    session_store.migrate().await?;

    let settings = ServeSettings::from_config(&config)?;
    let app = routes::app(app_state, session_store, settings);

    let bind_addr = config.bind_address();
    tracing::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
