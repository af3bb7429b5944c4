/// JWT Claims structure
///
/// Payload of an access token: identity, display name and role, plus the
/// registered claims (RFC 7519) a verifier checks.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Role;
use crate::error::AuthError;

/// Lifetime of an access token
pub const ACCESS_TOKEN_LIFETIME_HOURS: i64 = 10;

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Display name
    pub name: String,
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

impl Claims {
    pub fn new(
        user_id: Uuid,
        name: &str,
        role: Role,
        issued_at: DateTime<Utc>,
        issuer: &str,
        audience: &str,
    ) -> Self {
        let expires_at = issued_at + Duration::hours(ACCESS_TOKEN_LIFETIME_HOURS);
        Self {
            sub: user_id.to_string(),
            name: name.to_string(),
            role,
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
        }
    }

    /// Extract user ID from claims
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::TokenInvalid)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
