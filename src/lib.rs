//! Password-backed registration and short-lived bearer tokens.
//!
//! The [`auth`] module holds the core: a credential store, an Argon2
//! hasher, an HMAC token service and the [`auth::Authenticator`] tying
//! them together. [`app`] wraps it in an axum router.

pub mod app;
pub mod auth;
pub mod clock;
pub mod config;
pub mod state;
