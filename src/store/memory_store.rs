use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tracing::debug;

use super::{SessionStore, StoreError};
use crate::models::{Session, SessionData};

/// A process-local store. Sessions do not survive a restart.
pub struct MemoryStore {
    session: RwLock<Session>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            session: RwLock::new(Session::empty()),
        }
    }

    /// A store that starts out holding `data`.
    pub fn with_session(data: SessionData) -> Self {
        MemoryStore {
            session: RwLock::new(Session::from(data)),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn save(&self, session: &SessionData) -> Result<(), StoreError> {
        let mut current = self.session.write().unwrap_or_else(PoisonError::into_inner);
        *current = Session::from(session.clone());
        debug!(user_id = session.user_id.as_str(), "session saved in memory");
        Ok(())
    }

    async fn load(&self) -> Session {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Session::empty();
        Ok(())
    }

    async fn clear_if_current(&self, token: &str) -> Result<bool, StoreError> {
        let mut current = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if current.token() == Some(token) {
            *current = Session::empty();
            return Ok(true);
        }
        Ok(false)
    }

    fn describe(&self) -> &str {
        "memory"
    }
}
