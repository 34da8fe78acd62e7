pub mod jwt;
pub mod password;
pub mod refresh;

use axum::http::{HeaderMap, header};
use thiserror::Error;

/// Why a bearer credential was rejected. Every variant maps to 401 at the
/// HTTP layer; the split exists so tests and logs can tell them apart.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no Authorization header")]
    MissingAuthHeader,
    #[error("Authorization header is not a Bearer credential")]
    MalformedAuthHeader,
    #[error("token rejected: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("token subject is not a valid user ID: {0}")]
    Subject(#[from] uuid::Error),
}

/// Pull the raw token out of `Authorization: Bearer <token>`.
/// The prefix is mandatory; a bare token is rejected.
pub fn get_bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedAuthHeader)?;

    let token = raw
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedAuthHeader)?;

    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc123"),
        );
        assert_eq!(get_bearer_token(&headers).unwrap(), "abc123");
    }

    #[test]
    fn missing_header_rejected() {
        let headers = HeaderMap::new();
        assert!(matches!(
            get_bearer_token(&headers),
            Err(AuthError::MissingAuthHeader)
        ));
    }

    #[test]
    fn missing_prefix_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc123"));
        assert!(matches!(
            get_bearer_token(&headers),
            Err(AuthError::MalformedAuthHeader)
        ));
    }
}
