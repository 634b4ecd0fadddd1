//! # Configuration Management
//!
//! This module handles loading configuration from environment variables.
//! It uses the "12-factor app" methodology where configuration comes from the environment.
//!
//! ## Environment Variables
//! - `HOST`: Server bind address (default: 127.0.0.1)
//! - `PORT`: Server port (default: 3000)
//! - `DATABASE_URL`: SQLite database connection string
//! - `SESSION_SECRET`: Key material for signing session cookies (at least 64 bytes)
//! - `SESSION_TTL_HOURS`: Inactivity window before a session expires (default: 168)
//! - `COOKIE_SECURE`: Only send the session cookie over HTTPS (default: false)
//! - `BLOB_DIR`: Directory where uploaded images are written (default: uploads)
//! - `BLOB_BASE_URL`: Public URL prefix for uploaded images (default: /uploads)
//! - `STATIC_DIR`: Directory of static assets served under `/static`

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;

/// Minimum length of `SESSION_SECRET`, dictated by the cookie signing key.
pub const MIN_SESSION_SECRET_LEN: usize = 64;

/// Application configuration
///
/// Built once at startup and handed to [`crate::state::AppState::new`];
/// nothing else in the crate reads the environment.
#[derive(Clone)]
pub struct Config {
    /// Server host/IP address to bind to
    pub host: String,

    /// Server port number
    pub port: u16,

    /// SQLite database connection URL
    /// Format: "sqlite:filename.db?mode=rwc"
    pub database_url: String,

    /// Raw key material for signing session cookies.
    /// `None` means a random key is generated per process.
    pub session_secret: Option<Vec<u8>>,

    /// Hours of inactivity after which a session expires
    pub session_ttl_hours: i64,

    /// Whether the session cookie carries the `Secure` attribute
    pub cookie_secure: bool,

    /// Where the local blob store writes uploaded images
    pub blob_dir: PathBuf,

    /// URL prefix under which stored images are served
    pub blob_base_url: String,

    /// Static asset directory
    pub static_dir: PathBuf,
}

// Hand-written so the session secret never ends up in the logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("session_secret", &self.session_secret.as_ref().map(|_| "<redacted>"))
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("cookie_secure", &self.cookie_secure)
            .field("blob_dir", &self.blob_dir)
            .field("blob_base_url", &self.blob_base_url)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads variables from .env file (if present) using dotenvy
    /// 2. Reads each configuration value from environment
    /// 3. Falls back to sensible defaults if variables aren't set
    /// 4. Returns an error if a value is present but invalid
    ///
    /// ## Example .env file
    /// ```text
    /// HOST=127.0.0.1
    /// PORT=3000
    /// DATABASE_URL=sqlite:campgrounds.db?mode=rwc
    /// SESSION_SECRET=<64+ random bytes>
    /// ```
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (dotenvy doesn't error if file missing)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from any key lookup.
    ///
    /// `from_env` passes the process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = var("PORT", "3000")
            .parse()
            .context("PORT must be a number between 0 and 65535")?;

        let session_ttl_hours: i64 = var("SESSION_TTL_HOURS", "168")
            .parse()
            .context("SESSION_TTL_HOURS must be a whole number of hours")?;
        if session_ttl_hours <= 0 {
            bail!("SESSION_TTL_HOURS must be positive");
        }

        let cookie_secure = match var("COOKIE_SECURE", "false").to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            other => bail!("COOKIE_SECURE must be true or false, got '{other}'"),
        };

        // An empty value counts as unset so `.env.example` can be copied verbatim.
        let session_secret = match lookup("SESSION_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) if secret.len() < MIN_SESSION_SECRET_LEN => bail!(
                "SESSION_SECRET must be at least {MIN_SESSION_SECRET_LEN} bytes, got {}",
                secret.len()
            ),
            Some(secret) => Some(secret.into_bytes()),
            None => None,
        };

        let database_url = var("DATABASE_URL", "sqlite:campgrounds.db?mode=rwc");
        if !database_url.starts_with("sqlite:") {
            bail!("DATABASE_URL must be a sqlite: connection string");
        }

        Ok(Config {
            host: var("HOST", "127.0.0.1"),
            port,
            database_url,
            session_secret,
            session_ttl_hours,
            cookie_secure,
            blob_dir: PathBuf::from(var("BLOB_DIR", "uploads")),
            blob_base_url: var("BLOB_BASE_URL", "/uploads").trim_end_matches('/').to_string(),
            static_dir: PathBuf::from(var("STATIC_DIR", "static")),
        })
    }

    /// Get the socket address to bind the server to
    ///
    /// Combines host and port into a format suitable for TCP binding.
    /// Example: "127.0.0.1:3000"
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
