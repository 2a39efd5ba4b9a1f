use crate::domain::error::{AuthError, StoreError};
use crate::domain::repository::{CredentialHasher, UserRepository};
use crate::domain::user::{LoginRequest, RegisterRequest, UserRecord};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
}

impl AuthService {
    pub fn new(user_repository: Arc<dyn UserRepository>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self {
            user_repository,
            hasher,
        }
    }

    /// Validates, hashes and persists a new user. Returns the stored record.
    #[instrument(skip_all, fields(email))]
    pub async fn register_user(&self, req: RegisterRequest) -> Result<UserRecord, AuthError> {
        trace!("Starting user registration");

        let new_user = req.validate().inspect_err(|_| {
            warn!(request = ?req, "Missing fields in registration request");
        })?;
        tracing::Span::current().record("email", new_user.email.as_str());

        let password_hash = self.hash(new_user.password).await.map_err(|e| {
            error!(email = %new_user.email, error = %e, "Failed to hash password");
            e
        })?;

        let user = UserRecord {
            id: Uuid::new_v4().to_string(),
            username: new_user.username,
            email: new_user.email,
            password_hash,
            created_at: Utc::now(),
        };

        debug!(user_id = %user.id, email = %user.email, "Saving user to repository");
        match self.user_repository.save_user(user.clone()).await {
            Ok(()) => {}
            Err(e) if matches!(e.downcast_ref::<StoreError>(), Some(StoreError::DuplicateEmail(_))) => {
                warn!(email = %user.email, "User already exists");
                return Err(AuthError::EmailTaken);
            }
            Err(e) => {
                error!(email = %user.email, error = %e, "Failed to persist user");
                return Err(AuthError::Infrastructure(e));
            }
        }

        info!(user_id = %user.id, email = %user.email, "User registered successfully");
        Ok(user)
    }

    /// Verifies credentials and returns the stored username.
    ///
    /// An unknown email and a wrong password both yield
    /// `AuthError::InvalidCredentials`.
    #[instrument(skip_all, fields(email))]
    pub async fn login(&self, req: LoginRequest) -> Result<String, AuthError> {
        trace!("Starting login");

        let credentials = req.validate().inspect_err(|_| {
            warn!(email_present = req.email.is_some(), "Missing fields in login request");
        })?;
        tracing::Span::current().record("email", credentials.email.as_str());

        let user = self
            .user_repository
            .find_user_by_email(&credentials.email)
            .await
            .map_err(|e| {
                error!(email = %credentials.email, error = %e, "Failed to look up user");
                AuthError::Infrastructure(e)
            })?;

        let Some(user) = user else {
            warn!(email = %credentials.email, "Invalid credentials for email");
            return Err(AuthError::InvalidCredentials);
        };

        let is_valid = self
            .verify(credentials.password, user.password_hash)
            .await
            .map_err(|e| {
                error!(email = %credentials.email, error = %e, "Failed to verify password");
                e
            })?;

        if !is_valid {
            warn!(email = %credentials.email, "Invalid credentials for email");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %user.id, username = %user.username, "User logged in successfully");
        Ok(user.username)
    }

    // Hashing and verification run on the blocking pool.
    async fn hash(&self, password: String) -> Result<String, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .context("password hashing task failed")??;
        Ok(hash)
    }

    async fn verify(&self, password: String, hash: String) -> Result<bool, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let is_valid = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .context("password verification task failed")??;
        Ok(is_valid)
    }
}
