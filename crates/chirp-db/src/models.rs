/// Database row types — these map directly to SQLite rows.
/// Distinct from the chirp-types API models to keep the DB layer independent.
/// Timestamps are RFC 3339 strings; IDs are canonical UUID strings.

pub struct UserRow {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub email: String,
    pub hashed_password: String,
}

pub struct ChirpRow {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub body: String,
    pub user_id: String,
}

pub struct RefreshTokenRow {
    pub token: String,
    pub created_at: String,
    pub updated_at: String,
    pub user_id: String,
    pub expires_at: String,
    pub revoked_at: Option<String>,
}
