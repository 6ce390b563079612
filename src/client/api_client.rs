use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::ApiError;
use super::request::ApiRequest;
use crate::config::BackendConfig;
use crate::events::{ClientEvent, EventBus};
use crate::features::{ChatClient, RecipeClient, TravelClient};
use crate::models::{ApiEnvelope, Session};
use crate::store::SessionStore;

/// HTTP client that applies the current session to every request.
///
/// The store is read per request, so a login or logout elsewhere takes effect
/// on the next call without rebuilding the client.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    attach_user_id: bool,
    store: Arc<dyn SessionStore>,
    events: EventBus,
}

impl ApiClient {
    pub fn new(
        config: &BackendConfig,
        store: Arc<dyn SessionStore>,
        events: EventBus,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_in_ms))
            .build()
            .map_err(|e| ApiError::Network(format!("could not build HTTP client: {}", e)))?;
        info!(
            "Backend client targets '{}' (timeout {} ms, user id tagging {})",
            config.base_url,
            config.timeout_in_ms,
            if config.attach_user_id { "on" } else { "off" }
        );
        Ok(ApiClient {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            attach_user_id: config.attach_user_id,
            store,
            events,
        })
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn travel(&self) -> TravelClient<'_> {
        TravelClient::new(self)
    }

    pub fn chat(&self) -> ChatClient<'_> {
        ChatClient::new(self)
    }

    pub fn recipes(&self) -> RecipeClient<'_> {
        RecipeClient::new(self)
    }

    /// Send and decode the whole 2xx body as `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let (_, body) = self.execute(request).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Send, check the envelope's `success` flag and return its `data`.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let envelope = self.send_envelope(request).await?;
        let data = envelope
            .data
            .ok_or_else(|| ApiError::Decode("response carried no data".to_string()))?;
        serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Send where only the outcome matters; returns the backend's message.
    pub async fn send_message(&self, request: ApiRequest) -> Result<Option<String>, ApiError> {
        let envelope = self.send_envelope(request).await?;
        Ok(envelope.message)
    }

    /// Like [`ApiClient::send`], abandoned with `ApiError::Cancelled` as soon
    /// as `cancel` fires.
    pub async fn send_cancellable<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<T, ApiError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(event_name = "client.request.cancelled", event_domain = "client", "request cancelled by caller");
                Err(ApiError::Cancelled)
            }
            result = self.send(request) => result,
        }
    }

    async fn send_envelope(&self, request: ApiRequest) -> Result<ApiEnvelope<Value>, ApiError> {
        let (status, body) = self.execute(request).await?;
        let envelope: ApiEnvelope<Value> =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        if !envelope.success {
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: envelope.failure_message(),
            });
        }
        Ok(envelope)
    }

    /// Apply the session, send, and map non-2xx statuses to errors.
    async fn execute(&self, mut request: ApiRequest) -> Result<(StatusCode, String), ApiError> {
        let session = if request.requires_auth {
            self.store.load().await
        } else {
            Session::empty()
        };
        if self.attach_user_id {
            if let Some(user_id) = session.user_id() {
                request.apply_user_scope(user_id);
            }
        }

        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.http.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = session.token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    event_name = "client.request.failed",
                    event_domain = "client",
                    method = %request.method,
                    path = request.path.as_str(),
                    error = %e,
                    "request did not get a response"
                );
                return Err(ApiError::from_transport(e));
            }
        };
        let status = response.status();
        let body = response.text().await.map_err(ApiError::from_transport)?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        debug!(
            event_name = "client.request.completed",
            event_domain = "client",
            method = %request.method,
            path = request.path.as_str(),
            status = status.as_u16(),
            elapsed_ms,
            authenticated = session.is_authenticated(),
            "request completed"
        );

        if status.is_success() {
            return Ok((status, body));
        }

        let message = extract_message(&body);
        warn!(
            event_name = "client.request.rejected",
            event_domain = "client",
            method = %request.method,
            path = request.path.as_str(),
            status = status.as_u16(),
            message = message.as_deref().unwrap_or(""),
            "backend returned an error status"
        );
        if status == StatusCode::UNAUTHORIZED {
            if let Some(token) = session.token() {
                self.expire_session(token).await;
            }
        }
        Err(ApiError::from_status(status, message))
    }

    async fn expire_session(&self, token: &str) {
        match self.store.clear_if_current(token).await {
            Ok(true) => {
                warn!(
                    event_name = "client.session.expired",
                    event_domain = "client",
                    store = self.store.describe(),
                    "backend rejected the session token; session cleared"
                );
                self.events.publish(ClientEvent::SessionExpired);
            }
            Ok(false) => debug!("rejected token is no longer the current session"),
            Err(e) => warn!(error = %e, "could not clear the rejected session"),
        }
    }
}

/// The most useful text in an error body: the envelope's `error`, then its
/// `message`, then the raw body.
fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => ["error", "message"]
            .iter()
            .filter_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .find(|m| !m.is_empty())
            .map(str::to_string),
        Ok(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Ok(_) => None,
        Err(_) => Some(trimmed.to_string()),
    }
}
