use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::domain::error::AuthError;

pub const REGISTER_FIELDS_REQUIRED: &str = "All fields are required";
pub const LOGIN_FIELDS_REQUIRED: &str = "Email and password are required";

/// Persisted user document. `password_hash` holds a PHC string, never plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Registration body. Only a JSON object is accepted; anything else fails to
/// deserialize.
#[derive(Default, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct RegisterRequest {
    pub user: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Default, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A registration whose fields have all passed the presence check.
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub struct Credentials {
    pub email: String,
    pub password: String,
}

// Anything other than a JSON string is treated as an absent field.
fn text_field(body: &mut Map<String, Value>, key: &str) -> Option<String> {
    match body.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

impl From<Map<String, Value>> for RegisterRequest {
    fn from(mut body: Map<String, Value>) -> Self {
        Self {
            user: text_field(&mut body, "user"),
            email: text_field(&mut body, "email"),
            password: text_field(&mut body, "password"),
        }
    }
}

impl From<Map<String, Value>> for LoginRequest {
    fn from(mut body: Map<String, Value>) -> Self {
        Self {
            email: text_field(&mut body, "email"),
            password: text_field(&mut body, "password"),
        }
    }
}

fn present(field: &Option<String>) -> Option<String> {
    field.as_deref().filter(|value| !value.is_empty()).map(str::to_string)
}

fn redacted(field: &Option<String>) -> &'static str {
    match field.as_deref() {
        Some(value) if !value.is_empty() => "<redacted>",
        _ => "<missing>",
    }
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<NewUser, AuthError> {
        match (
            present(&self.user),
            present(&self.email),
            present(&self.password),
        ) {
            (Some(username), Some(email), Some(password)) => Ok(NewUser {
                username,
                email,
                password,
            }),
            _ => Err(AuthError::Validation(REGISTER_FIELDS_REQUIRED)),
        }
    }
}

impl LoginRequest {
    pub fn validate(&self) -> Result<Credentials, AuthError> {
        match (present(&self.email), present(&self.password)) {
            (Some(email), Some(password)) => Ok(Credentials { email, password }),
            _ => Err(AuthError::Validation(LOGIN_FIELDS_REQUIRED)),
        }
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("user", &self.user)
            .field("email", &self.email)
            .field("password", &redacted(&self.password))
            .finish()
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &redacted(&self.password))
            .finish()
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}
