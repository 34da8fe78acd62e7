use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use tracing::error;
use uuid::Uuid;

use chirp_db::models::UserRow;
use chirp_types::api::{CreateUserRequest, UpdateUserRequest};
use chirp_types::models::User;

use crate::error::ApiError;
use crate::state::AppState;
use crate::{parse_id, parse_ts};

pub(crate) fn user_from_row(row: UserRow) -> User {
    User {
        id: parse_id(&row.id, "user id"),
        created_at: parse_ts(&row.created_at, "user created_at"),
        updated_at: parse_ts(&row.updated_at, "user updated_at"),
        email: row.email,
    }
}

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    // Malformed bodies map to 500, not 400. Load-bearing for API clients.
    let Json(req) = payload.map_err(|_| ApiError::internal("Couldn't decode parameters"))?;

    let hashed = chirp_auth::password::hash_password(&req.password)
        .map_err(|_| ApiError::internal("Couldn't hash password"))?;

    let id = Uuid::new_v4();
    let now = Utc::now();
    let now_text = now.to_rfc3339();

    let db = state.clone();
    let row_id = id.to_string();
    let email = req.email.clone();
    tokio::task::spawn_blocking(move || {
        db.db.create_user(&row_id, &now_text, &now_text, &email, &hashed)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::internal("Couldn't create user")
    })?
    // A duplicate email trips the UNIQUE constraint and lands here too;
    // surfaced as a generic 500, not a conflict.
    .map_err(|_| ApiError::internal("Couldn't create user"))?;

    Ok((
        StatusCode::CREATED,
        Json(User {
            id,
            created_at: now,
            updated_at: now,
            email: req.email,
        }),
    ))
}

pub async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload.map_err(|_| ApiError::internal("Couldn't decode parameters"))?;

    let token = chirp_auth::get_bearer_token(&headers)
        .map_err(|_| ApiError::unauthorized("No valid bearer token in Authorization header"))?;

    let user_id = chirp_auth::jwt::validate_jwt(&token, &state.jwt_secret)
        .map_err(|_| ApiError::unauthorized("Access token validation failed"))?;

    let hashed = chirp_auth::password::hash_password(&req.password)
        .map_err(|_| ApiError::internal("Couldn't hash password"))?;

    let now_text = Utc::now().to_rfc3339();

    let db = state.clone();
    let row_id = user_id.to_string();
    let email = req.email.clone();
    let row = tokio::task::spawn_blocking(move || {
        db.db.update_user(&row_id, &email, &hashed, &now_text)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::internal("Error updating user information")
    })?
    .map_err(|_| ApiError::internal("Error updating user information"))?
    .ok_or_else(|| ApiError::internal("Error updating user information"))?;

    Ok(Json(user_from_row(row)))
}
