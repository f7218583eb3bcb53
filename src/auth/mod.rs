use crate::state::AppState;
use axum::Router;

pub mod claims;
pub mod dto;
pub mod errors;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use claims::{SignedToken, TokenClaims};
pub use errors::{AuthError, StoreError, TokenError};
pub use jwt::TokenService;
pub use repo::{CredentialStore, InMemoryStore};
pub use repo_types::UserRecord;
pub use services::Authenticator;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
