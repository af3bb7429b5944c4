use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::UserStore;
use crate::domain::{NewUser, Role, StoredRefreshToken, User};
use crate::error::StoreError;

const SELECT_USER: &str = r#"
    SELECT id, name, email, password_hash, role, refresh_token, refresh_token_expiry, version
    FROM users
"#;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    refresh_token: Option<String>,
    refresh_token_expiry: Option<DateTime<Utc>>,
    version: i64,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<Role>().map_err(StoreError::Unexpected)?;
        let refresh_token = match (row.refresh_token, row.refresh_token_expiry) {
            (Some(token), Some(expires_at)) => Some(StoredRefreshToken { token, expires_at }),
            (None, None) => None,
            _ => {
                return Err(StoreError::Unexpected(format!(
                    "User {} has a refresh token without expiry",
                    row.id
                )))
            }
        };

        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            refresh_token,
            version: row.version,
        })
    }
}

/// User store backed by the `users` table
#[derive(Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>(&format!("{} WHERE email = $1", SELECT_USER))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>(&format!("{} WHERE id = $1", SELECT_USER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn exists(&self, email: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, refresh_token, refresh_token_expiry, version, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 1, $8)
            RETURNING id, name, email, password_hash, role, refresh_token, refresh_token_expiry, version
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.refresh_token.token)
        .bind(user.refresh_token.expires_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        User::try_from(row)
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        let (token, expiry) = match &user.refresh_token {
            Some(refresh) => (Some(refresh.token.as_str()), Some(refresh.expires_at)),
            None => (None, None),
        };

        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $1, password_hash = $2, refresh_token = $3, refresh_token_expiry = $4,
                version = version + 1
            WHERE id = $5 AND version = $6
            "#,
        )
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(token)
        .bind(expiry)
        .bind(user.id)
        .bind(user.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(user_id = %user.id, version = user.version, "Stale user update rejected");
            return Err(StoreError::Conflict);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
            password_hash: "$2b$04$hash".to_string(),
            role: "Admin".to_string(),
            refresh_token: Some("token".to_string()),
            refresh_token_expiry: Some(Utc::now()),
            version: 3,
        }
    }

    #[test]
    fn test_row_conversion() {
        let user = User::try_from(row()).unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.refresh_token.unwrap().token, "token");
        assert_eq!(user.version, 3);
    }

    #[test]
    fn test_half_set_refresh_token_is_rejected() {
        let mut broken = row();
        broken.refresh_token_expiry = None;
        assert!(User::try_from(broken).is_err());
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let mut broken = row();
        broken.role = "Root".to_string();
        assert!(User::try_from(broken).is_err());
    }
}
