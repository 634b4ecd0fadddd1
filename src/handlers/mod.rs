//! # HTTP Request Handlers
//!
//! This module contains all the HTTP route handlers (controllers).
//!
//! ## Submodules
//! - `home`: Landing page and the 404 fallback
//! - `auth`: Register, login, logout
//! - `listings`: Campground CRUD
//! - `reviews`: Adding and removing reviews on a campground
//!
//! ## Handler Pattern
//! Handlers are async functions that:
//! 1. Extract data from the request (path params, form body, session, and
//!    whatever the auth/ownership middleware put into the extensions)
//! 2. Validate input and call the stores
//! 3. Return a rendered page, or flash a message and redirect
//!
//! ## Example Handler
//! ```rust,ignore
//! pub async fn my_handler(
//!     State(state): State<AppState>,   // Shared app state
//!     session: Session,                // Flash messages, signed-in user
//!     Form(form): Form<MyForm>,        // URL-encoded form body
//! ) -> AppResult<Redirect> {
//!     // Do work here
//!     session::flash_success(&session, "Done!").await?;
//!     Ok(Redirect::to("/campgrounds"))
//! }
//! ```
//!
//! Handlers that might redirect take a `Session` and only load a
//! `PageContext` when they actually render, since loading it consumes the
//! pending flash messages.

pub mod auth;
pub mod home;
pub mod listings;
pub mod reviews;
