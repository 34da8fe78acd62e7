use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use chirp_db::Database;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    /// Platform sentinel; "dev" unlocks the destructive admin surface.
    pub platform: String,
    /// Requests served from the static file area. Reset only by
    /// POST /admin/reset.
    pub hits: AtomicU64,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: String, platform: String) -> AppState {
        Arc::new(Self {
            db,
            jwt_secret,
            platform,
            hits: AtomicU64::new(0),
        })
    }
}
