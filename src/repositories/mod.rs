//! User persistence boundary and its backends.

mod memory;
mod postgres;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::User;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Email already taken; raised atomically by `create`.
    #[error("a user with this email already exists")]
    DuplicateIdentity,

    #[error("database error: {0}")]
    Backend(#[from] sqlx::Error),
}

/// Persistence for user records, keyed by unique normalized email.
///
/// `create` is the only place uniqueness is decided: implementations must reject a
/// duplicate email in the same atomic step that would insert it.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: &User) -> Result<(), StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
}
