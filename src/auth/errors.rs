//! Failure kinds raised by the authentication core.
//!
//! Each component reports its own specific kinds. The [`Authenticator`]
//! narrows them before they reach a caller: token and lookup failures on
//! token resolution become [`AuthError::Unauthorized`], unknown users and
//! wrong passwords on login become [`AuthError::InvalidCredentials`].
//!
//! [`Authenticator`]: crate::auth::services::Authenticator

use thiserror::Error;

/// Errors from the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("user `{0}` already exists")]
    AlreadyExists(String),
    #[error("user `{0}` not found")]
    NotFound(String),
}

/// Reasons a presented token is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
}

/// Errors returned by the authenticator to its callers.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user already exists")]
    AlreadyExists,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unauthorized")]
    Unauthorized,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
