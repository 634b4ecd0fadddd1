//! # Router
//!
//! The whole HTTP surface in one place.
//!
//! ## Routes
//! | Method | Path | Guards |
//! |---|---|---|
//! | GET | `/` | |
//! | GET, POST | `/register`, `/login` | |
//! | GET | `/logout` | |
//! | GET | `/campgrounds` | |
//! | POST | `/campgrounds` | auth |
//! | GET | `/campgrounds/new` | auth |
//! | GET | `/campgrounds/{id}` | |
//! | PUT, DELETE | `/campgrounds/{id}` | auth, listing owner |
//! | GET | `/campgrounds/{id}/edit` | auth, listing owner |
//! | POST | `/campgrounds/{id}/reviews` | auth |
//! | DELETE | `/campgrounds/{id}/reviews/{review_id}` | auth, review owner |
//!
//! ## Layers (outermost first)
//! 1. Security headers on every response, static files and uploads included
//! 2. Method override: must see the request before routing does
//! 3. HTTP tracing
//! 4. Sessions
//! 5. Body size limit for photo uploads

use crate::config::Config;
use crate::handlers::{auth, home, listings, reviews};
use crate::middleware::auth::require_auth;
use crate::middleware::method_override::method_override;
use crate::middleware::ownership::{require_listing_owner, require_review_owner};
use crate::session::SessionSettings;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use std::path::PathBuf;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

/// Largest accepted request body (multipart photo uploads included)
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Name of the session id cookie
pub const SESSION_COOKIE: &str = "session";

/// Pages load scripts, styles and forms from this origin only. Images may
/// also come from any HTTPS host (seeded photos, hosted blob stores).
pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; img-src 'self' https: data:; \
     object-src 'none'; base-uri 'self'; form-action 'self'; frame-ancestors 'none'";

/// Everything the router needs besides the state and the session store.
#[derive(Clone)]
pub struct ServeSettings {
    pub session: SessionSettings,

    /// Served under `/static`
    pub static_dir: PathBuf,

    /// URL prefix and directory of locally stored images, when the blob
    /// store hands out local URLs
    pub uploads: Option<(String, PathBuf)>,
}

impl ServeSettings {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let uploads = config
            .blob_base_url
            .starts_with('/')
            .then(|| (config.blob_base_url.clone(), config.blob_dir.clone()));

        Ok(Self {
            session: SessionSettings::from_config(config)?,
            static_dir: config.static_dir.clone(),
            uploads,
        })
    }
}

/// Build the application.
pub fn app<S>(state: AppState, session_store: S, settings: ServeSettings) -> Router
where
    S: SessionStore + Clone,
{
    let owner_only = from_fn_with_state(state.clone(), require_listing_owner);
    let review_owner_only = from_fn_with_state(state.clone(), require_review_owner);

    let mut router = Router::new()
        .route("/", get(home::home))
        .route("/register", get(auth::register_form).post(auth::register))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        .route(
            "/campgrounds",
            get(listings::index).merge(post(listings::create).route_layer(from_fn(require_auth))),
        )
        .route(
            "/campgrounds/new",
            get(listings::new_form).route_layer(from_fn(require_auth)),
        )
        .route(
            "/campgrounds/{id}",
            get(listings::show).merge(
                put(listings::update)
                    .delete(listings::delete)
                    .route_layer(owner_only.clone())
                    .route_layer(from_fn(require_auth)),
            ),
        )
        .route(
            "/campgrounds/{id}/edit",
            get(listings::edit_form)
                .route_layer(owner_only)
                .route_layer(from_fn(require_auth)),
        )
        .route(
            "/campgrounds/{id}/reviews",
            post(reviews::create).route_layer(from_fn(require_auth)),
        )
        .route(
            "/campgrounds/{id}/reviews/{review_id}",
            delete(reviews::delete)
                .route_layer(review_owner_only)
                .route_layer(from_fn(require_auth)),
        )
        .nest_service("/static", ServeDir::new(&settings.static_dir));

    if let Some((prefix, dir)) = &settings.uploads {
        router = router.nest_service(prefix, ServeDir::new(dir));
    }

    let session_layer = SessionManagerLayer::new(session_store)
        .with_name(SESSION_COOKIE)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(settings.session.secure)
        .with_expiry(Expiry::OnInactivity(settings.session.ttl))
        .with_signed(settings.session.key.clone());

    let inner = router
        .fallback(home::not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Routing happens inside `inner`, so the override has to wrap it whole.
    Router::new()
        .fallback_service(inner)
        .layer(from_fn(method_override))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("same-origin"),
        ))
}
