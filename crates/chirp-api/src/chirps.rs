use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use tracing::error;
use uuid::Uuid;

use chirp_db::models::ChirpRow;
use chirp_types::api::CreateChirpRequest;
use chirp_types::models::Chirp;

use crate::error::ApiError;
use crate::state::AppState;
use crate::{parse_id, parse_ts};

const MAX_CHIRP_LEN: usize = 140;
const MASKED_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];
const MASK: &str = "****";

/// Whole-token masking: split on single spaces, replace case-insensitive
/// matches, rejoin. A word with punctuation attached ("Sharbert's") is a
/// different token and passes through untouched.
pub(crate) fn clean_body(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            if MASKED_WORDS.iter().any(|w| word.eq_ignore_ascii_case(w)) {
                MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Bodies are stored raw; the mask is applied on the way out.
fn chirp_from_row(row: ChirpRow) -> Chirp {
    Chirp {
        id: parse_id(&row.id, "chirp id"),
        created_at: parse_ts(&row.created_at, "chirp created_at"),
        updated_at: parse_ts(&row.updated_at, "chirp updated_at"),
        body: clean_body(&row.body),
        user_id: parse_id(&row.user_id, "chirp user_id"),
    }
}

pub async fn create_chirp(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateChirpRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload.map_err(|_| ApiError::internal("Couldn't decode parameters"))?;

    let token = chirp_auth::get_bearer_token(&headers)
        .map_err(|_| ApiError::unauthorized("No valid bearer token in Authorization header"))?;

    let user_id = chirp_auth::jwt::validate_jwt(&token, &state.jwt_secret)
        .map_err(|_| ApiError::unauthorized("Access token validation failed"))?;

    // Length check runs after auth: an over-long chirp from an anonymous
    // caller still gets 401, not 400.
    if req.body.chars().count() > MAX_CHIRP_LEN {
        return Err(ApiError::bad_request("Chirp is too long"));
    }

    let id = Uuid::new_v4();
    let now = Utc::now();
    let now_text = now.to_rfc3339();

    let db = state.clone();
    let row_id = id.to_string();
    let author_id = user_id.to_string();
    let body = req.body.clone();
    tokio::task::spawn_blocking(move || {
        db.db.create_chirp(&row_id, &now_text, &now_text, &body, &author_id)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::internal("Couldn't create chirp record")
    })?
    .map_err(|_| ApiError::internal("Couldn't create chirp record"))?;

    Ok((
        StatusCode::CREATED,
        Json(Chirp {
            id,
            created_at: now,
            updated_at: now,
            body: clean_body(&req.body),
            user_id,
        }),
    ))
}

pub async fn get_chirps(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.get_all_chirps())
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal("Couldn't retrieve chirps")
        })?
        .map_err(|_| ApiError::internal("Couldn't retrieve chirps"))?;

    let chirps: Vec<Chirp> = rows.into_iter().map(chirp_from_row).collect();
    Ok(Json(chirps))
}

pub async fn get_chirp(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    // A malformed UUID in the path maps to 500, not 404. Load-bearing.
    let chirp_id = id
        .parse::<Uuid>()
        .map_err(|_| ApiError::internal("Could not parse chirp ID"))?;

    let db = state.clone();
    let row_id = chirp_id.to_string();
    let row = tokio::task::spawn_blocking(move || db.db.get_chirp_by_id(&row_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal("Couldn't retrieve chirp")
        })?
        .map_err(|_| ApiError::internal("Couldn't retrieve chirp"))?
        .ok_or_else(|| ApiError::not_found("Could not retrieve chirp with given ID"))?;

    Ok(Json(chirp_from_row(row)))
}
