use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{SessionStore, StoreError};
use crate::models::{Profile, Session, SessionData};

/// On-disk record. Every field is optional so that a hand-edited or torn
/// file can be detected instead of failing to parse.
#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    token: Option<String>,
    user_id: Option<String>,
    user: Option<Profile>,
}

impl StoredSession {
    fn into_session(self, path: &Path) -> Session {
        match (self.token, self.user) {
            (Some(token), Some(user)) if !token.is_empty() => {
                let user_id = self.user_id.unwrap_or_else(|| user.username.clone());
                Session::from(SessionData::new(token, user).with_user_id(user_id))
            }
            (None, None) => Session::empty(),
            _ => {
                warn!(
                    event_name = "store.file.incomplete",
                    event_domain = "store",
                    path = %path.display(),
                    "session file holds a token without a profile or vice versa; ignoring it"
                );
                Session::empty()
            }
        }
    }
}

impl From<&SessionData> for StoredSession {
    fn from(data: &SessionData) -> Self {
        StoredSession {
            token: Some(data.token.clone()),
            user_id: Some(data.user_id.clone()),
            user: Some(data.profile.clone()),
        }
    }
}

/// A store that keeps the session in a JSON file so it survives restarts.
///
/// Reads are served from an in-memory copy. Writers in this process are
/// serialized; each writer replaces the file through its own uniquely named
/// sibling temp file, so other processes on the same path never see a torn record.
pub struct FileStore {
    path: PathBuf,
    current: RwLock<Session>,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open the store at `path`. A missing or unreadable file yields an empty session.
    pub async fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let session = read_session(&path).await;
        debug!(
            path = %path.display(),
            authenticated = session.is_authenticated(),
            "opened file session store"
        );
        FileStore {
            path,
            current: RwLock::new(session),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn set_current(&self, session: Session) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    // Caller must hold `write_lock`.
    async fn remove_file(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

async fn read_session(path: &Path) -> Session {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Session::empty(),
        Err(e) => {
            warn!(path = %path.display(), "could not read session file: {}", e);
            return Session::empty();
        }
    };
    match serde_json::from_slice::<StoredSession>(&bytes) {
        Ok(stored) => stored.into_session(path),
        Err(e) => {
            warn!(path = %path.display(), "session file is not valid JSON: {}", e);
            Session::empty()
        }
    }
}

// The temp file is created 0600 on unix and removed on drop if persisting fails.
fn write_replacing(dir: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl SessionStore for FileStore {
    async fn save(&self, session: &SessionData) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let bytes = serde_json::to_vec_pretty(&StoredSession::from(session))?;
        let dir = self.parent_dir();
        tokio::fs::create_dir_all(&dir).await?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_replacing(&dir, &path, &bytes))
            .await
            .map_err(|e| std::io::Error::new(ErrorKind::Other, e))??;

        self.set_current(Session::from(session.clone()));
        debug!(
            path = %self.path.display(),
            user_id = session.user_id.as_str(),
            "session written to file"
        );
        Ok(())
    }

    async fn load(&self) -> Session {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.remove_file().await?;
        self.set_current(Session::empty());
        Ok(())
    }

    async fn clear_if_current(&self, token: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        if self.load().await.token() != Some(token) {
            return Ok(false);
        }
        self.remove_file().await?;
        self.set_current(Session::empty());
        Ok(true)
    }

    fn describe(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn alice() -> SessionData {
        SessionData::new(
            "T1",
            Profile::new("alice", Some("alice@example.com".to_string())),
        )
    }

    /// Test that a saved session is visible to a store reopened on the same file.
    #[tokio::test]
    async fn test_session_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileStore::open(&path).await;
        store.save(&alice()).await.unwrap();
        assert_eq!(store.load().await, Session::from(alice()));

        let reopened = FileStore::open(&path).await;
        assert_eq!(reopened.load().await, Session::from(alice()));
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1, "only the session file should remain");
    }

    /// Test that two stores on one file can save concurrently without errors
    /// and leave a complete record behind.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_on_one_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let first = Arc::new(FileStore::open(&path).await);
        let second = Arc::new(FileStore::open(&path).await);

        let mut tasks = Vec::new();
        for i in 0..100 {
            let store = if i % 2 == 0 { first.clone() } else { second.clone() };
            tasks.push(tokio::spawn(async move {
                let token = format!("T{i}-{}", "x".repeat(64 * 1024));
                let data = SessionData::new(token, Profile::new("alice", None));
                store.save(&data).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let reopened = FileStore::open(&path).await.load().await;
        assert!(reopened.is_authenticated());
        assert_eq!(reopened.user_id(), Some("alice"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    /// Test that clear removes the file and can be repeated.
    #[tokio::test]
    async fn test_clear_removes_file_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileStore::open(&path).await;
        store.save(&alice()).await.unwrap();

        store.clear().await.unwrap();
        assert!(!path.exists());
        store.clear().await.unwrap();
        assert!(!store.load().await.is_authenticated());
        assert!(!FileStore::open(&path).await.load().await.is_authenticated());
    }

    /// Test that a corrupt file loads as an empty session.
    #[tokio::test]
    async fn test_corrupt_file_is_empty_session() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(!FileStore::open(&path).await.load().await.is_authenticated());
    }

    /// Test that a token without a profile is not treated as a session.
    #[tokio::test]
    async fn test_token_without_profile_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, br#"{"token": "T1", "userId": "alice"}"#).unwrap();
        assert_eq!(FileStore::open(&path).await.load().await, Session::empty());
    }

    /// Test that a record without userId falls back to the username.
    #[tokio::test]
    async fn test_missing_user_id_falls_back_to_username() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, br#"{"token": "T1", "user": {"username": "alice"}}"#).unwrap();
        let session = FileStore::open(&path).await.load().await;
        assert_eq!(session.user_id(), Some("alice"));
    }

    /// Test that compare-and-clear leaves a newer session alone.
    #[tokio::test]
    async fn test_clear_if_current_keeps_newer_session() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("session.json")).await;
        store.save(&alice()).await.unwrap();

        assert!(!store.clear_if_current("stale").await.unwrap());
        assert!(store.path().exists());
        assert!(store.clear_if_current("T1").await.unwrap());
        assert!(!store.path().exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("session.json")).await;
        store.save(&alice()).await.unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
