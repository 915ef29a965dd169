/// Authenticated request context and session bookkeeping
///
/// The API's auth layer turns a validated access token into an [`AuthContext`]
/// and stores it in the request extensions. Sessions live in the cache under
/// two key families:
///
/// | Key | Value | TTL |
/// |---|---|---|
/// | `refresh_token:{jti}` | user ID | refresh token lifetime |
/// | `revoked_access:{jti}` | `"1"` | remaining access token lifetime |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;

/// Identity of the caller for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,

    /// `jti` of the access token presented
    pub token_id: Uuid,

    pub expires_at: DateTime<Utc>,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            token_id: claims.jti,
            expires_at: claims.expires_at(),
        }
    }
}

/// Why an `Authorization` header was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BearerError {
    #[error("Missing Authorization header")]
    Missing,

    #[error("Invalid Authorization header format, expected 'Bearer <token>'")]
    InvalidFormat,
}

/// Extracts the token from an `Authorization: Bearer <token>` header value
pub fn parse_bearer(header: Option<&str>) -> Result<&str, BearerError> {
    let value = header.ok_or(BearerError::Missing)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(BearerError::InvalidFormat)?
        .trim();

    if token.is_empty() {
        return Err(BearerError::InvalidFormat);
    }
    Ok(token)
}

pub fn refresh_session_key(jti: Uuid) -> String {
    format!("refresh_token:{}", jti)
}

pub fn revoked_access_key(jti: Uuid) -> String {
    format!("revoked_access:{}", jti)
}
