use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{file_store::FileStore, memory_store::MemoryStore};
use crate::config::SessionStoreConfig;
use crate::models::{Session, SessionData};

/// Failures of the persistence medium behind a store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("session record could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The SessionStore trait abstracts where the current session lives
/// (save, load, clear). It is the single source of truth for auth state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist token, user id and profile together. Readers observe either
    /// the previous session or the new one, never a mix.
    async fn save(&self, session: &SessionData) -> Result<(), StoreError>;

    /// The current session, possibly empty. Never fails.
    async fn load(&self) -> Session;

    /// Remove the session. Clearing an empty store is a no-op.
    async fn clear(&self) -> Result<(), StoreError>;

    /// Clear only if the stored token is still `token`.
    ///
    /// Returns whether this call removed the session, so concurrent callers
    /// reacting to the same rejected token agree on a single winner.
    async fn clear_if_current(&self, token: &str) -> Result<bool, StoreError>;

    /// Short backend name for log lines.
    fn describe(&self) -> &str;
}

/// Creates a concrete store implementation based on the SessionStoreConfig.
pub async fn create_store(config: &SessionStoreConfig) -> Arc<dyn SessionStore> {
    match config {
        SessionStoreConfig::Memory => {
            info!("Session store is memory-backed; sessions end with the process.");
            Arc::new(MemoryStore::new())
        }
        SessionStoreConfig::File(file_config) => {
            let store = FileStore::open(&file_config.path).await;
            info!(
                "Session store is file-backed at '{}'",
                file_config.path.display()
            );
            Arc::new(store)
        }
    }
}
