use std::path::Path;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use chirp_api::middleware::track_hit;
use chirp_api::state::AppState;
use chirp_api::{admin, chirps, sessions, system, users};

/// Assemble the full application router. Factored out of main so the
/// black-box tests can drive the same stack without binding a socket.
pub fn router(state: AppState, public_dir: &Path) -> Router {
    let api_routes = Router::new()
        .route("/api/healthz", get(system::healthz))
        .route(
            "/api/chirps",
            get(chirps::get_chirps).post(chirps::create_chirp),
        )
        .route("/api/chirps/{id}", get(chirps::get_chirp))
        .route(
            "/api/users",
            post(users::create_user).put(users::update_user),
        )
        .route("/api/login", post(sessions::login))
        .route("/api/refresh", post(sessions::refresh))
        .route("/api/revoke", post(sessions::revoke))
        .route("/admin/metrics", get(admin::metrics))
        .route("/admin/reset", post(admin::reset))
        .with_state(state.clone());

    // Only the static file area is hit-counted.
    let app_routes = Router::new()
        .nest_service("/app", ServeDir::new(public_dir))
        .layer(axum::middleware::from_fn_with_state(state, track_hit));

    Router::new()
        .merge(api_routes)
        .merge(app_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
