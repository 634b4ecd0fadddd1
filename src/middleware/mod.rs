//! # Middleware Module
//!
//! Middleware intercepts HTTP requests before they reach a handler.
//!
//! ## Our Middleware
//! - `method_override`: Turns `POST ?_method=DELETE` form submissions into real DELETE/PUT requests
//! - `auth`: Checks that a user is signed in (otherwise redirect to `/login`)
//! - `ownership`: Checks that the signed-in user authored the listing/review being changed
//!
//! ## Ordering
//! `auth` must run before `ownership`: the ownership check reads the user that
//! `auth` put into the request. With `route_layer`, the layer added last runs first.

pub mod auth;
pub mod method_override;
pub mod ownership;
