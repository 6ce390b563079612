//! Client initialization.
//!
//! Builds the session store, event bus, HTTP client and auth service from a
//! loaded configuration.

use std::sync::Arc;

use tracing::info;

use crate::auth::AuthService;
use crate::client::{ApiClient, ApiError};
use crate::config::ConfigV1;
use crate::events::EventBus;
use crate::state::ClientContext;
use crate::store::create_store;

/// Wire up a [`ClientContext`] for `config`.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub async fn build_context(config: Arc<ConfigV1>) -> Result<ClientContext, ApiError> {
    let store = create_store(&config.session).await;
    let events = EventBus::default();
    let api = Arc::new(ApiClient::new(&config.backend, store.clone(), events.clone())?);
    let auth = Arc::new(AuthService::new(api.clone()));

    let session = store.load().await;
    info!(
        event_name = "startup.context.ready",
        event_domain = "startup",
        store = store.describe(),
        authenticated = session.is_authenticated(),
        "client context ready"
    );

    Ok(ClientContext {
        config,
        store,
        api,
        auth,
        events,
    })
}
