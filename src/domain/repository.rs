use crate::domain::user::UserRecord;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persists a new record. Fails with `StoreError::DuplicateEmail` when the
    /// email is already present; the check and the insert are atomic.
    async fn save_user(&self, user: UserRecord) -> Result<()>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;
}

/// One-way salted password hashing.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;
    /// `Ok(false)` on mismatch; `Err` only when `hash` cannot be parsed or
    /// the primitive itself fails.
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}
