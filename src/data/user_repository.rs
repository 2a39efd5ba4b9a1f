use crate::domain::error::StoreError;
use crate::domain::repository::UserRepository;
use crate::domain::user::UserRecord;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace, warn};

/// Process-local credential store keyed by email.
#[derive(Clone)]
pub struct InMemoryUserRepository {
    storage: Arc<RwLock<HashMap<String, UserRecord>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.storage.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.storage.read().await.is_empty()
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id, email = %user.email))]
    async fn save_user(&self, user: UserRecord) -> Result<()> {
        trace!("Acquiring write lock for user storage");
        let mut storage = self.storage.write().await;
        if storage.contains_key(&user.email) {
            warn!(email = %user.email, "Rejecting duplicate email");
            return Err(StoreError::DuplicateEmail(user.email).into());
        }
        debug!(user_id = %user.id, "User saved to memory storage");
        storage.insert(user.email.clone(), user);
        Ok(())
    }

    #[instrument(skip(self), fields(email = email))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let storage = self.storage.read().await;
        let user = storage.get(email).cloned();
        match &user {
            Some(u) => debug!(user_id = %u.id, "User found in storage"),
            None => trace!("User not found in storage"),
        }
        Ok(user)
    }
}
