pub mod admin;
pub mod chirps;
pub mod error;
pub mod middleware;
pub mod sessions;
pub mod state;
pub mod system;
pub mod users;

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

/// Rows keep timestamps as RFC 3339 text; a row that fails to parse is
/// logged and rendered with the epoch rather than failing the request.
pub(crate) fn parse_ts(raw: &str, context: &str) -> DateTime<Utc> {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} timestamp '{}': {}", context, raw, e);
        DateTime::default()
    })
}

pub(crate) fn parse_id(raw: &str, context: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", context, raw, e);
        Uuid::default()
    })
}
