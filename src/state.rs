//! Everything a front end needs to talk to the backend, wired together.

use std::sync::Arc;

use crate::auth::AuthService;
use crate::client::ApiClient;
use crate::config::ConfigV1;
use crate::events::EventBus;
use crate::store::SessionStore;

/// Shared client state. Cheap to clone; every field is a handle.
#[derive(Clone)]
pub struct ClientContext {
    /// Configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// The single source of truth for the current session.
    pub store: Arc<dyn SessionStore>,
    /// Authenticated HTTP client; feature clients borrow from it.
    pub api: Arc<ApiClient>,
    pub auth: Arc<AuthService>,
    pub events: EventBus,
}
