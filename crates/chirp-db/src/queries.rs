use crate::Database;
use crate::models::{ChirpRow, RefreshTokenRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        created_at: &str,
        updated_at: &str,
        email: &str,
        hashed_password: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, created_at, updated_at, email, hashed_password)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, created_at, updated_at, email, hashed_password),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Replace email and password. Returns the updated row, or None when the
    /// user no longer exists.
    pub fn update_user(
        &self,
        id: &str,
        email: &str,
        hashed_password: &str,
        updated_at: &str,
    ) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET email = ?1, hashed_password = ?2, updated_at = ?3 WHERE id = ?4",
                (email, hashed_password, updated_at, id),
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_user(conn, "id", id)
        })
    }

    /// Clears every user; chirps and refresh tokens go with them via
    /// ON DELETE CASCADE.
    pub fn delete_all_users(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM users", [])?;
            Ok(())
        })
    }

    // -- Chirps --

    pub fn create_chirp(
        &self,
        id: &str,
        created_at: &str,
        updated_at: &str,
        body: &str,
        user_id: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chirps (id, created_at, updated_at, body, user_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, created_at, updated_at, body, user_id),
            )?;
            Ok(())
        })
    }

    pub fn get_all_chirps(&self) -> Result<Vec<ChirpRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, created_at, updated_at, body, user_id
                 FROM chirps
                 ORDER BY created_at ASC",
            )?;

            let rows = stmt
                .query_map([], chirp_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_chirp_by_id(&self, id: &str) -> Result<Option<ChirpRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, created_at, updated_at, body, user_id
                 FROM chirps
                 WHERE id = ?1",
            )?;

            let row = stmt.query_row([id], chirp_from_row).optional()?;
            Ok(row)
        })
    }

    // -- Refresh tokens --

    pub fn create_refresh_token(
        &self,
        token: &str,
        created_at: &str,
        updated_at: &str,
        user_id: &str,
        expires_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO refresh_tokens (token, created_at, updated_at, user_id, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (token, created_at, updated_at, user_id, expires_at),
            )?;
            Ok(())
        })
    }

    pub fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshTokenRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT token, created_at, updated_at, user_id, expires_at, revoked_at
                 FROM refresh_tokens
                 WHERE token = ?1",
            )?;

            let row = stmt
                .query_row([token], |row| {
                    Ok(RefreshTokenRow {
                        token: row.get(0)?,
                        created_at: row.get(1)?,
                        updated_at: row.get(2)?,
                        user_id: row.get(3)?,
                        expires_at: row.get(4)?,
                        revoked_at: row.get(5)?,
                    })
                })
                .optional()?;

            Ok(row)
        })
    }

    /// Stamps revoked_at. Not guarded against re-revocation; a second call
    /// just overwrites the timestamp.
    pub fn revoke_refresh_token(&self, token: &str, revoked_at: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE refresh_tokens SET revoked_at = ?1, updated_at = ?1 WHERE token = ?2",
                (revoked_at, token),
            )?;
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // column is one of two fixed identifiers, never user input
    let sql = format!(
        "SELECT id, created_at, updated_at, email, hashed_password FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                created_at: row.get(1)?,
                updated_at: row.get(2)?,
                email: row.get(3)?,
                hashed_password: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn chirp_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<ChirpRow, rusqlite::Error> {
    Ok(ChirpRow {
        id: row.get(0)?,
        created_at: row.get(1)?,
        updated_at: row.get(2)?,
        body: row.get(3)?,
        user_id: row.get(4)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
