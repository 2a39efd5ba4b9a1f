pub mod document;
pub mod user_repository;

use crate::domain::error::StoreError;
use crate::domain::repository::UserRepository;
use document::DocumentUserRepository;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use user_repository::InMemoryUserRepository;

/// Where the credential store lives, parsed from the connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    File(PathBuf),
}

impl StoreLocation {
    /// Accepts `memory://` and `file://<path>`. Returns `None` for any other
    /// scheme or an empty file path.
    pub fn parse(url: &str) -> Option<Self> {
        let url = url.trim();
        if url == "memory://" || url == "memory:" {
            return Some(StoreLocation::Memory);
        }
        url.strip_prefix("file://")
            .filter(|path| !path.is_empty())
            .map(|path| StoreLocation::File(PathBuf::from(path)))
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreLocation::Memory => write!(f, "memory"),
            StoreLocation::File(_) => write!(f, "document file"),
        }
    }
}

pub async fn connect(location: &StoreLocation) -> Result<Arc<dyn UserRepository>, StoreError> {
    match location {
        StoreLocation::Memory => Ok(Arc::new(InMemoryUserRepository::new())),
        StoreLocation::File(path) => Ok(Arc::new(DocumentUserRepository::open(path).await?)),
    }
}
