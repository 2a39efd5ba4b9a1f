use thiserror::Error;

/// Coarse classification of an [`AuthError`], used to pick the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authentication,
    Conflict,
    Infrastructure,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("Invalid Credentials")]
    InvalidCredentials,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Infrastructure failure: {0:#}")]
    Infrastructure(#[from] anyhow::Error),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) => ErrorKind::Validation,
            AuthError::InvalidCredentials => ErrorKind::Authentication,
            AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::Infrastructure(_) => ErrorKind::Infrastructure,
        }
    }
}

/// Failures raised by credential store implementations.
///
/// Repositories return `anyhow::Result`; callers that care about a specific
/// case recover it with `downcast_ref::<StoreError>()`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt document on line {line}: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),
}
