use std::sync::atomic::Ordering;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
};
use tracing::error;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let count = state.hits.load(Ordering::Relaxed);
    Html(format!(
        "<html><body><h1>Welcome, Chirp Admin</h1><p>Chirp has been visited {} times!</p></body></html>",
        count
    ))
}

/// Clears the hit counter and deletes every user. The user purge runs
/// before the platform gate; the gate only decides the status code.
/// Known defect, preserved for API compatibility (see DESIGN.md).
pub async fn reset(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.hits.store(0, Ordering::SeqCst);

    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.delete_all_users())
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal("Could not reset user database table")
        })?
        .map_err(|_| ApiError::internal("Could not reset user database table"))?;

    if state.platform == "dev" {
        Ok(StatusCode::OK)
    } else {
        Ok(StatusCode::FORBIDDEN)
    }
}
