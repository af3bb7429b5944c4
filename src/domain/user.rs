use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Role assigned once, at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Admin iff the email is on the allow-list (exact match).
    pub fn for_email(email: &str, admin_allow_list: &HashSet<String>) -> Self {
        if admin_allow_list.contains(email) {
            Role::Admin
        } else {
            Role::User
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(Role::User),
            "Admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// The single live refresh token of a user.
///
/// Token and expiry travel together so one can never be written without the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRefreshToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredRefreshToken {
    /// Expiry is exclusive: a token expiring exactly at `now` is already dead.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Persisted user record
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub refresh_token: Option<StoredRefreshToken>,
    /// Optimistic concurrency stamp, bumped by the store on every update.
    #[serde(skip_serializing)]
    pub version: i64,
}

/// A user record that has not been inserted yet
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub refresh_token: StoredRefreshToken,
}

/// Access + refresh token pair returned by login and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_role_from_allow_list() {
        let allow_list: HashSet<String> = ["admin@x.com".to_string()].into_iter().collect();

        assert_eq!(Role::for_email("admin@x.com", &allow_list), Role::Admin);
        assert_eq!(Role::for_email("ann@x.com", &allow_list), Role::User);
        // exact match as stored
        assert_eq!(Role::for_email("Admin@x.com", &allow_list), Role::User);
        assert_eq!(Role::for_email("admin@x.com", &HashSet::new()), Role::User);
    }

    #[test]
    fn test_role_round_trips_through_text() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(Role::User.to_string(), "User");
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_refresh_token_expiry_boundary() {
        let now = Utc::now();
        let token = StoredRefreshToken {
            token: "t".to_string(),
            expires_at: now,
        };

        assert!(token.is_expired_at(now));
        assert!(token.is_expired_at(now + Duration::seconds(1)));
        assert!(!token.is_expired_at(now - Duration::seconds(1)));
    }

    #[test]
    fn test_serialized_user_hides_secrets() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
            password_hash: "$2b$04$secret".to_string(),
            role: Role::User,
            refresh_token: Some(StoredRefreshToken {
                token: "opaque".to_string(),
                expires_at: Utc::now(),
            }),
            version: 1,
        };

        let json = serde_json::to_value(&user).expect("Failed to serialize user");
        assert_eq!(json["role"], "User");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("refresh_token").is_none());
        assert!(json.get("version").is_none());
    }
}
