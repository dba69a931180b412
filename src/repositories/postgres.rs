//! PostgreSQL-backed [`UserStore`].

use async_trait::async_trait;
use uuid::Uuid;

use super::{StoreError, UserStore};
use crate::db::{self, DbPool};
use crate::models::User;

#[derive(Clone)]
pub struct PgUserStore {
    pool: DbPool,
}

impl PgUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: &User) -> Result<(), StoreError> {
        db::user_create(&self.pool, user).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(db::user_find_by_email(&self.pool, email).await?.map(User::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(db::user_get_by_id(&self.pool, id).await?.map(User::from))
    }
}
