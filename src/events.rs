//! Notification channel between operations that change state and the views
//! that depend on it.
//!
//! A save or delete publishes `SavedItemsChanged`; a dashboard that shows
//! counts subscribes and reloads on that event instead of polling a flag.

use tokio::sync::broadcast;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 64;

/// The feature area an event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Travel,
    Chat,
    Recipe,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    LoggedIn { username: String },
    LoggedOut,
    /// The backend rejected the current token; the session has been cleared
    /// and the user must log in again.
    SessionExpired,
    SavedItemsChanged(Feature),
}

/// Cloneable handle to a broadcast channel of `ClientEvent`s.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        EventBus { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.sender.subscribe()
    }

    /// Publish to every current subscriber. Having none is fine.
    pub fn publish(&self, event: ClientEvent) {
        let receivers = self.sender.receiver_count();
        debug!(?event, receivers, "publishing client event");
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
