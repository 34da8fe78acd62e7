use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::{DateTime, Duration, Utc};
use tracing::error;
use uuid::Uuid;

use chirp_types::api::{LoginRequest, LoginResponse, TokenResponse};

use crate::error::ApiError;
use crate::parse_ts;
use crate::state::AppState;

/// Access tokens live for an hour; refresh tokens for sixty days.
fn access_token_ttl() -> Duration {
    Duration::hours(1)
}

fn refresh_token_ttl() -> Duration {
    Duration::days(60)
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload.map_err(|_| ApiError::internal("Couldn't decode parameters"))?;

    let db = state.clone();
    let email = req.email.clone();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_email(&email))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal("Couldn't look up user")
        })?
        .map_err(|_| ApiError::internal("Couldn't look up user"))?
        // Unknown email and bad password share one message on purpose.
        .ok_or_else(|| ApiError::unauthorized("Incorrect email or password"))?;

    chirp_auth::password::verify_password(&user.hashed_password, &req.password)
        .map_err(|_| ApiError::unauthorized("Incorrect email or password"))?;

    let user_id = user
        .id
        .parse::<Uuid>()
        .map_err(|_| ApiError::internal("Corrupt user record"))?;

    let token = chirp_auth::jwt::make_jwt(user_id, &state.jwt_secret, access_token_ttl())
        .map_err(|_| ApiError::internal("Error creating access token"))?;

    let refresh_token = chirp_auth::refresh::make_refresh_token();
    let now = Utc::now();
    let now_text = now.to_rfc3339();
    let expires_text = (now + refresh_token_ttl()).to_rfc3339();

    let db = state.clone();
    let token_row = refresh_token.clone();
    let owner = user.id.clone();
    tokio::task::spawn_blocking(move || {
        db.db
            .create_refresh_token(&token_row, &now_text, &now_text, &owner, &expires_text)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::internal("Error storing refresh token")
    })?
    .map_err(|_| ApiError::internal("Error storing refresh token"))?;

    Ok(Json(LoginResponse {
        id: user_id,
        created_at: parse_ts(&user.created_at, "user created_at"),
        updated_at: parse_ts(&user.updated_at, "user updated_at"),
        email: user.email,
        token,
        refresh_token,
    }))
}

pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = chirp_auth::get_bearer_token(&headers)
        .map_err(|_| ApiError::unauthorized("No valid bearer token in Authorization header"))?;

    let db = state.clone();
    let lookup = token.clone();
    let row = tokio::task::spawn_blocking(move || db.db.get_refresh_token(&lookup))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal("Couldn't look up refresh token")
        })?
        .map_err(|_| ApiError::internal("Couldn't look up refresh token"))?
        .ok_or_else(|| ApiError::unauthorized("Refresh token not found"))?;

    let expires_at = row
        .expires_at
        .parse::<DateTime<Utc>>()
        .map_err(|_| ApiError::internal("Corrupt refresh token record"))?;

    if Utc::now() > expires_at {
        return Err(ApiError::unauthorized("Refresh token is expired"));
    }
    if row.revoked_at.is_some() {
        return Err(ApiError::unauthorized("Refresh token is revoked"));
    }

    let user_id = row
        .user_id
        .parse::<Uuid>()
        .map_err(|_| ApiError::internal("Corrupt refresh token record"))?;

    // Fresh access token only; the refresh token itself is never rotated.
    let token = chirp_auth::jwt::make_jwt(user_id, &state.jwt_secret, access_token_ttl())
        .map_err(|_| ApiError::internal("Error creating access token"))?;

    Ok(Json(TokenResponse { token }))
}

pub async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = chirp_auth::get_bearer_token(&headers)
        .map_err(|_| ApiError::unauthorized("No valid bearer token in Authorization header"))?;

    let db = state.clone();
    let lookup = token.clone();
    tokio::task::spawn_blocking(move || db.db.get_refresh_token(&lookup))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal("Couldn't look up refresh token")
        })?
        .map_err(|_| ApiError::internal("Couldn't look up refresh token"))?
        .ok_or_else(|| ApiError::unauthorized("Refresh token not found"))?;

    let now_text = Utc::now().to_rfc3339();
    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.revoke_refresh_token(&token, &now_text))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal("Error revoking refresh token")
        })?
        .map_err(|_| ApiError::internal("Error revoking refresh token"))?;

    Ok(StatusCode::NO_CONTENT)
}
