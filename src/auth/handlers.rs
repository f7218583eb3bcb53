use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Form, Json, Router,
};
use tracing::{error, instrument};

use crate::{
    auth::{
        dto::{LoginForm, MessageResponse, PublicUser, RegisterRequest, TokenResponse},
        errors::AuthError,
        extractors::bearer_token,
        repo_types::UserRecord,
    },
    state::AppState,
};

type Rejection = (StatusCode, String);

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/protected", get(protected))
}

fn reject(err: AuthError) -> Rejection {
    match err {
        AuthError::AlreadyExists => (StatusCode::BAD_REQUEST, "User already exists".into()),
        AuthError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            "Wrong username or password".into(),
        ),
        AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "Invalid token".into()),
        AuthError::Internal(e) => {
            error!(error = %e, "internal auth failure");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into())
        }
    }
}

fn join_failed(e: tokio::task::JoinError) -> Rejection {
    error!(error = %e, "blocking auth task failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into())
}

fn current_user(state: &AppState, headers: &HeaderMap) -> Result<UserRecord, Rejection> {
    let token = bearer_token(headers)?;
    state.auth.resolve_token(token).map_err(reject)
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<MessageResponse>, Rejection> {
    let RegisterRequest {
        username,
        email,
        password,
    } = payload;

    // Argon2 is CPU-bound; keep it off the async workers.
    let auth = state.auth.clone();
    tokio::task::spawn_blocking(move || auth.register(&username, &email, &password))
        .await
        .map_err(join_failed)?
        .map_err(reject)?;

    Ok(Json(MessageResponse::new("User created successfully")))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, Rejection> {
    let LoginForm { username, password } = form;

    let auth = state.auth.clone();
    let token = tokio::task::spawn_blocking(move || auth.login(&username, &password))
        .await
        .map_err(join_failed)?
        .map_err(reject)?;

    Ok(Json(TokenResponse::bearer(token.into_inner())))
}

#[instrument(skip_all)]
pub async fn get_me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PublicUser>, Rejection> {
    let user = current_user(&state, &headers)?;
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip_all)]
pub async fn protected(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, Rejection> {
    let user = current_user(&state, &headers)?;
    Ok(Json(MessageResponse::new(format!(
        "Hello {}, you are authenticated!",
        user.username
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_hide_which_credential_was_wrong() {
        let (status, body) = reject(AuthError::InvalidCredentials);
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Wrong username or password");
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let (status, body) = reject(AuthError::Internal(anyhow::anyhow!("argon2 exploded")));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("argon2"));
    }

    #[test]
    fn public_user_serialization_omits_hash() {
        let user = UserRecord {
            username: "alice".into(),
            email: "a@x.com".into(),
            password_hash: "$argon2id$secret".into(),
        };
        let json = serde_json::to_value(PublicUser::from(user)).unwrap();
        assert_eq!(json, serde_json::json!({"username": "alice", "email": "a@x.com"}));
    }
}
