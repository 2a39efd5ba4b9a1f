//! Credential store backed by a JSON-lines document file.
//!
//! Every document is one line. The file is read completely when the store is
//! opened and each insert is appended and flushed before `save_user` returns,
//! so a restarted process sees every acknowledged registration. A failed
//! append is truncated away, leaving the file and the map in agreement.
use crate::domain::error::StoreError;
use crate::domain::repository::UserRepository;
use crate::domain::user::UserRecord;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, trace, warn};

#[derive(Clone)]
pub struct DocumentUserRepository {
    path: PathBuf,
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
}

impl DocumentUserRepository {
    /// Opens the document file at `path`, creating it (and its parent
    /// directory) when absent.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut users = HashMap::new();
        match fs::read_to_string(&path).await {
            Ok(contents) => {
                for (index, line) in contents.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let user: UserRecord = serde_json::from_str(line).map_err(|source| {
                        StoreError::Corrupt {
                            line: index + 1,
                            source,
                        }
                    })?;
                    match users.entry(user.email.clone()) {
                        Entry::Vacant(slot) => {
                            slot.insert(user);
                        }
                        Entry::Occupied(_) => {
                            warn!(line = index + 1, email = %user.email, "Ignoring duplicate document");
                        }
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .await?;
            }
            Err(e) => return Err(e.into()),
        }

        info!(users = users.len(), "Document store opened");
        Ok(Self {
            path,
            users: Arc::new(RwLock::new(users)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, user: &UserRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(user).map_err(StoreError::Encode)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let committed = file.metadata().await?.len();

        let written: std::io::Result<()> = async {
            file.write_all(&line).await?;
            file.sync_data().await
        }
        .await;
        if let Err(e) = written {
            self.truncate(committed).await;
            return Err(e.into());
        }
        Ok(())
    }

    // Drops everything past `len` so a failed append leaves no trace on disk.
    async fn truncate(&self, len: u64) {
        let result = async {
            let file = OpenOptions::new().write(true).open(&self.path).await?;
            file.set_len(len).await?;
            file.sync_data().await
        }
        .await;
        if let Err(e) = result {
            error!(error = %e, len, "Failed to roll back document file");
        }
    }
}

#[async_trait]
impl UserRepository for DocumentUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id, email = %user.email))]
    async fn save_user(&self, user: UserRecord) -> Result<()> {
        // Held across the append so concurrent inserts of one email serialize.
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            warn!(email = %user.email, "Rejecting duplicate email");
            return Err(StoreError::DuplicateEmail(user.email).into());
        }
        self.append(&user).await?;
        debug!(user_id = %user.id, "User document appended");
        users.insert(user.email.clone(), user);
        Ok(())
    }

    #[instrument(skip(self), fields(email = email))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let users = self.users.read().await;
        let user = users.get(email).cloned();
        if user.is_none() {
            trace!("User not found in document store");
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(id: &str, email: &str) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            username: format!("name-{}", id),
            email: email.to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_open_creates_missing_file_and_parent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("users.jsonl");

        let store = DocumentUserRepository::open(&path).await.unwrap();

        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
        assert!(store.find_user_by_email("a@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_saved_users_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users.jsonl");

        let store = DocumentUserRepository::open(&path).await.unwrap();
        let alice = record("user-1", "alice@example.com");
        let bob = record("user-2", "bob@example.com");
        store.save_user(alice.clone()).await.unwrap();
        store.save_user(bob.clone()).await.unwrap();
        drop(store);

        let reopened = DocumentUserRepository::open(&path).await.unwrap();
        assert_eq!(
            reopened
                .find_user_by_email("alice@example.com")
                .await
                .unwrap(),
            Some(alice)
        );
        assert_eq!(
            reopened.find_user_by_email("bob@example.com").await.unwrap(),
            Some(bob)
        );

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_not_appended() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users.jsonl");
        let store = DocumentUserRepository::open(&path).await.unwrap();

        store
            .save_user(record("user-1", "dup@example.com"))
            .await
            .unwrap();
        let err = store
            .save_user(record("user-2", "dup@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::DuplicateEmail(_))
        ));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_failed_append_leaves_memory_and_file_in_step() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users.jsonl");
        let store = DocumentUserRepository::open(&path).await.unwrap();
        let alice = record("user-1", "alice@example.com");
        store.save_user(alice.clone()).await.unwrap();

        // Swap the file for a directory so the next append cannot open it
        let saved = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let err = store
            .save_user(record("user-2", "bob@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::Io(_))));
        assert!(store.find_user_by_email("bob@example.com").await.unwrap().is_none());

        std::fs::remove_dir(&path).unwrap();
        std::fs::write(&path, &saved).unwrap();

        // The same email can be registered once the file is writable again
        let bob = record("user-3", "bob@example.com");
        store.save_user(bob.clone()).await.unwrap();

        let reopened = DocumentUserRepository::open(&path).await.unwrap();
        assert_eq!(
            reopened.find_user_by_email("alice@example.com").await.unwrap(),
            Some(alice)
        );
        assert_eq!(
            reopened.find_user_by_email("bob@example.com").await.unwrap(),
            Some(bob)
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[tokio::test]
    async fn test_truncate_discards_partial_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users.jsonl");
        let store = DocumentUserRepository::open(&path).await.unwrap();
        let alice = record("user-1", "alice@example.com");
        store.save_user(alice.clone()).await.unwrap();
        let committed = std::fs::metadata(&path).unwrap().len();

        {
            use std::io::Write;
            let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(br#"{"id":"user-2","username":"bo"#).unwrap();
        }
        assert!(DocumentUserRepository::open(&path).await.is_err());

        store.truncate(committed).await;

        assert_eq!(std::fs::metadata(&path).unwrap().len(), committed);
        let reopened = DocumentUserRepository::open(&path).await.unwrap();
        assert_eq!(
            reopened.find_user_by_email("alice@example.com").await.unwrap(),
            Some(alice)
        );
    }

    #[tokio::test]
    async fn test_open_reports_corrupt_line_number() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users.jsonl");
        let valid = serde_json::to_string(&record("user-1", "a@x.com")).unwrap();
        std::fs::write(&path, format!("{}\n\n{{not json\n", valid)).unwrap();

        let err = DocumentUserRepository::open(&path).await.err().unwrap();
        assert!(matches!(err, StoreError::Corrupt { line: 3, .. }));
    }

    #[tokio::test]
    async fn test_open_keeps_first_of_duplicate_documents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users.jsonl");
        let first = record("user-1", "same@example.com");
        let second = record("user-2", "same@example.com");
        std::fs::write(
            &path,
            format!(
                "{}\n{}\n",
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            ),
        )
        .unwrap();

        let store = DocumentUserRepository::open(&path).await.unwrap();
        let found = store
            .find_user_by_email("same@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "user-1");
    }
}
