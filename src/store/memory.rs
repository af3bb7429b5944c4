use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::UserStore;
use crate::domain::{NewUser, User};
use crate::error::StoreError;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
}

/// Process-local user store, used by tests and for running without Postgres
#[derive(Default)]
pub struct InMemoryUserStore {
    tables: RwLock<Tables>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_email
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.tables.read().await.by_email.contains_key(email))
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.by_email.contains_key(&user.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let record = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            refresh_token: Some(user.refresh_token),
            version: 1,
        };
        tables.by_email.insert(record.email.clone(), record.id);
        tables.users.insert(record.id, record.clone());

        Ok(record)
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .users
            .get_mut(&user.id)
            .ok_or_else(|| StoreError::Unexpected(format!("No user with id {}", user.id)))?;

        if stored.version != user.version {
            return Err(StoreError::Conflict);
        }

        // email and role are fixed after creation
        stored.name = user.name.clone();
        stored.password_hash = user.password_hash.clone();
        stored.refresh_token = user.refresh_token.clone();
        stored.version += 1;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, StoredRefreshToken};
    use chrono::Utc;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ann".to_string(),
            email: email.to_string(),
            password_hash: "$2b$04$hash".to_string(),
            role: Role::User,
            refresh_token: StoredRefreshToken {
                token: "first".to_string(),
                expires_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = InMemoryUserStore::new();
        let user = store.insert(new_user("ann@x.com")).await.unwrap();

        assert!(store.exists("ann@x.com").await.unwrap());
        assert!(!store.exists("bob@x.com").await.unwrap());
        assert_eq!(store.find_by_id(user.id).await.unwrap().unwrap().email, "ann@x.com");
        assert_eq!(store.find_by_email("ann@x.com").await.unwrap().unwrap().id, user.id);
        assert!(store.find_by_email("ANN@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = InMemoryUserStore::new();
        store.insert(new_user("ann@x.com")).await.unwrap();

        let result = store.insert(new_user("ann@x.com")).await;
        assert_eq!(result.unwrap_err(), StoreError::DuplicateEmail);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_stale_update_conflicts() {
        let store = InMemoryUserStore::new();
        let user = store.insert(new_user("ann@x.com")).await.unwrap();

        let mut first = user.clone();
        first.refresh_token.as_mut().unwrap().token = "second".to_string();
        store.update(&first).await.unwrap();

        let mut stale = user.clone();
        stale.refresh_token.as_mut().unwrap().token = "third".to_string();
        assert_eq!(store.update(&stale).await.unwrap_err(), StoreError::Conflict);

        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.unwrap().token, "second");
        assert_eq!(stored.version, user.version + 1);
    }
}
