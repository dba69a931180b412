//! Registration and login: ties the user store, the password hasher and the token service together.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::auth::{IssuedToken, PasswordHasher, TokenService};
use crate::error::{AppError, AppResult};
use crate::models::{normalize_email, User};
use crate::repositories::UserStore;

// Verified against when the email is unknown so both login failures cost one Argon2 run.
const DUMMY_PASSWORD: &str = "authstarter-timing-equalizer";

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    dummy_digest: Arc<str>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> AppResult<Self> {
        let dummy_digest = hasher.hash(DUMMY_PASSWORD)?;
        Ok(Self {
            users,
            hasher,
            tokens,
            dummy_digest: dummy_digest.into(),
        })
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    pub fn tokens(&self) -> &Arc<dyn TokenService> {
        &self.tokens
    }

    /// Create an account and return its id.
    ///
    /// Fails with [`AppError::DuplicateIdentity`] when the normalized email is taken,
    /// including when a concurrent registration wins the insert.
    pub async fn register(&self, email: &str, password: &str) -> AppResult<Uuid> {
        let email = normalize_email(email);
        validate_email(&email)?;

        if self.users.find_by_email(&email).await?.is_some() {
            debug!("registration rejected: email taken");
            return Err(AppError::DuplicateIdentity);
        }

        let password_hash = self.hash(password).await?;
        let user = User::new(email, password_hash, Utc::now());
        self.users.create(&user).await?;

        info!(user_id = %user.id, "user registered");
        Ok(user.id)
    }

    /// Check credentials and issue a token.
    ///
    /// Unknown email and wrong password are indistinguishable: same error, and both
    /// pay for one password verification.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<IssuedToken> {
        let email = normalize_email(email);

        let user = self.users.find_by_email(&email).await?;
        let digest = match &user {
            Some(u) => u.password_hash.clone(),
            None => self.dummy_digest.to_string(),
        };
        let matches = self.verify(password, digest).await?;

        let user = match user {
            Some(u) if matches => u,
            _ => {
                debug!("login rejected");
                return Err(AppError::InvalidCredentials);
            }
        };

        let issued = self.tokens.issue(user.id, Utc::now())?;
        info!(user_id = %user.id, "user logged in");
        Ok(issued)
    }

    async fn hash(&self, password: &str) -> AppResult<String> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let digest = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("hash task: {}", e)))??;
        Ok(digest)
    }

    async fn verify(&self, password: &str, digest: String) -> AppResult<bool> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let ok = tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("verify task: {}", e)))??;
        Ok(ok)
    }
}

pub fn validate_email(email: &str) -> AppResult<()> {
    if !email.validate_email() {
        return Err(AppError::Validation("Invalid email".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Argon2Hasher, JwtTokenService};
    use crate::config::HashParams;
    use crate::repositories::{InMemoryUserStore, StoreError};
    use async_trait::async_trait;
    use chrono::Duration;

    fn service_with(users: Arc<dyn UserStore>) -> AuthService {
        let hasher = Argon2Hasher::new(HashParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        let tokens = JwtTokenService::new("test-jwt-secret-min-32-chars!!!!", Duration::hours(1));
        AuthService::new(users, Arc::new(hasher), Arc::new(tokens)).unwrap()
    }

    fn service() -> (AuthService, InMemoryUserStore) {
        let store = InMemoryUserStore::new();
        (service_with(Arc::new(store.clone())), store)
    }

    #[test]
    fn validate_email_accepts_valid() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("a@b.co").is_ok());
    }

    #[test]
    fn validate_email_rejects_invalid() {
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@nodomain").is_err());
        assert!(validate_email("").is_err());
    }

    #[tokio::test]
    async fn register_stores_normalized_email_and_digest() {
        let (auth, store) = service();
        let id = auth.register("  A@Ex.com ", "pw123").await.unwrap();

        let user = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.email, "a@ex.com");
        assert_ne!(user.password_hash, "pw123");
        assert_eq!(user.created_at, user.updated_at);
    }

    #[tokio::test]
    async fn register_rejects_case_variant_duplicate() {
        let (auth, store) = service();
        auth.register("A@Ex.com", "pw123").await.unwrap();
        let err = auth.register("a@ex.com", "pw456").await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateIdentity));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn register_rejects_invalid_email() {
        let (auth, store) = service();
        let err = auth.register("not-an-email", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn login_issues_token_for_registered_user() {
        let (auth, _) = service();
        let id = auth.register("A@Ex.com", "pw123").await.unwrap();
        let issued = auth.login("a@EX.com", "pw123").await.unwrap();
        assert_eq!(auth.tokens().validate(&issued.token, Utc::now()).unwrap(), id);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let (auth, _) = service();
        auth.register("real@x.com", "rightpass").await.unwrap();

        let unknown = auth.login("noexist@x.com", "whatever").await.unwrap_err();
        let wrong = auth.login("real@x.com", "wrongpass").await.unwrap_err();
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.status(), wrong.status());
    }

    /// Store whose lookup never sees the racing insert, so only `create` can catch it.
    struct BlindStore(InMemoryUserStore);

    #[async_trait]
    impl UserStore for BlindStore {
        async fn create(&self, user: &User) -> Result<(), StoreError> {
            self.0.create(user).await
        }
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
            Ok(None)
        }
        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            self.0.find_by_id(id).await
        }
    }

    #[tokio::test]
    async fn store_level_duplicate_maps_to_duplicate_identity() {
        let inner = InMemoryUserStore::new();
        let auth = service_with(Arc::new(BlindStore(inner.clone())));
        auth.register("a@ex.com", "one").await.unwrap();
        let err = auth.register("A@EX.COM", "two").await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateIdentity));
        assert_eq!(inner.len().await, 1);
    }
}
