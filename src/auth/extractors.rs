use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};

/// Pull the raw token out of `Authorization: Bearer <token>`.
///
/// Handlers call this themselves and pass the token to
/// [`Authenticator::resolve_token`](crate::auth::services::Authenticator::resolve_token).
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, (StatusCode, String)> {
    let not_authenticated = || (StatusCode::UNAUTHORIZED, "Not authenticated".to_string());

    // Read Authorization header
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(not_authenticated)?;

    // Expect "Bearer <token>"
    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(not_authenticated)?;

    Ok(token)
}
