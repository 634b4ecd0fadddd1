//! # Accounts Module
//!
//! Username/password accounts on top of the user store.
//!
//! ## Submodules
//! - `password`: Argon2id hashing and verification
//! - `registration`: Creating a new account
//! - `authentication`: Checking credentials at login
//!
//! ## Flow Overview
//!
//! ### Registration
//! 1. Handler validates the form → `validation::validate_registration()`
//! 2. `registration::register()` rejects taken usernames, hashes the password, stores the user
//! 3. Handler starts a session for the new user
//!
//! ### Authentication
//! 1. `authentication::authenticate()` looks the user up and verifies the password
//! 2. Any failure is the same `AppError::AuthFailure`
//! 3. Handler starts a session and redirects to the remembered page

pub mod authentication;
pub mod password;
pub mod registration;
