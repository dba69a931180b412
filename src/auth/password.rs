//! Password hashing: the `PasswordHasher` capability and its Argon2id backend.

use argon2::{
    password_hash::{
        rand_core::OsRng, Error as PhcError, PasswordHash, PasswordHasher as _, PasswordVerifier,
        SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

use crate::config::HashParams;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("hashing failed: {0}")]
    Hashing(String),
    #[error("stored digest is unreadable: {0}")]
    CorruptDigest(String),
}

/// One-way password transform.
///
/// Every call to `hash` salts afresh, so two digests of the same plaintext differ;
/// only `verify` can tell whether they match.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;

    /// `Ok(false)` on mismatch. Errors are reserved for digests that cannot be parsed or used.
    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, HashError>;
}

/// Argon2id with a random per-call salt; digests are PHC strings.
#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new(params: HashParams) -> Result<Self, HashError> {
        let params = Params::new(params.memory_kib, params.iterations, params.parallelism, None)
            .map_err(|e| HashError::Hashing(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| HashError::Hashing(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, HashError> {
        let parsed =
            PasswordHash::new(digest).map_err(|e| HashError::CorruptDigest(e.to_string()))?;
        // Parameters embedded in the digest win over ours; the output
        // comparison inside is constant-time.
        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PhcError::Password) => Ok(false),
            Err(e) => Err(HashError::CorruptDigest(e.to_string())),
        }
    }
}
