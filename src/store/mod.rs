/// User record store
///
/// Abstract persistence for user records. Implementations must make
/// `update` a compare-and-swap on `User::version`: a write based on a stale
/// read fails with `StoreError::Conflict` instead of clobbering a newer
/// refresh token.

mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{NewUser, User};
use crate::error::StoreError;

pub use memory::InMemoryUserStore;
pub use postgres::PostgresUserStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn exists(&self, email: &str) -> Result<bool, StoreError>;

    /// Insert a new record; `StoreError::DuplicateEmail` if the email is taken.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    /// Persist all mutable fields of `user`.
    ///
    /// Succeeds only when the stored version equals `user.version`, and bumps it.
    async fn update(&self, user: &User) -> Result<(), StoreError>;
}
