use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::require_text;
use crate::client::{ApiClient, ApiError, ApiRequest, UserScope};
use crate::events::{ClientEvent, Feature};
use crate::models::{ChatMessage, SaveChat};

const BLANK_PROMPT: &str = "Please enter a message";

pub struct ChatClient<'a> {
    api: &'a ApiClient,
}

impl<'a> ChatClient<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        ChatClient { api }
    }

    /// A fresh conversation id to group saved messages under.
    pub fn new_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub async fn ask(&self, prompt: &str) -> Result<String, ApiError> {
        self.api.send(prompt_request("/api/chat/ask", prompt)?).await
    }

    pub async fn ask_cancellable(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        self.api
            .send_cancellable(prompt_request("/api/chat/ask", prompt)?, cancel)
            .await
    }

    /// Alternative answers to `prompt`, as one block of text.
    pub async fn options(&self, prompt: &str) -> Result<String, ApiError> {
        self.api
            .send(prompt_request("/api/chat/options", prompt)?)
            .await
    }

    pub async fn save(&self, message: &SaveChat) -> Result<ChatMessage, ApiError> {
        require_text(&message.prompt, BLANK_PROMPT)?;
        let request = ApiRequest::post("/api/chat/save")
            .json(message)?
            .scoped(UserScope::Body);
        let saved = self.api.send(request).await?;
        self.changed();
        Ok(saved)
    }

    /// Saved messages, newest first, optionally limited to one conversation.
    pub async fn history(&self, session_id: Option<&str>) -> Result<Vec<ChatMessage>, ApiError> {
        let request = ApiRequest::get("/api/chat/history")
            .query_opt("sessionId", session_id)
            .scoped(UserScope::Query);
        self.api.send(request).await
    }

    /// Messages of one conversation, oldest first.
    pub async fn session(&self, session_id: &str) -> Result<Vec<ChatMessage>, ApiError> {
        let session_id = require_text(session_id, "A conversation id is required")?;
        self.api
            .send(ApiRequest::get(format!("/api/chat/session/{session_id}")).scoped(UserScope::Query))
            .await
    }

    /// Delete every saved message of the current user.
    pub async fn clear_history(&self) -> Result<Option<String>, ApiError> {
        let message = self
            .api
            .send_message(ApiRequest::delete("/api/chat/history/clear").scoped(UserScope::Query))
            .await?;
        self.changed();
        Ok(message)
    }

    fn changed(&self) {
        self.api
            .events()
            .publish(ClientEvent::SavedItemsChanged(Feature::Chat));
    }
}

fn prompt_request(path: &str, prompt: &str) -> Result<ApiRequest, ApiError> {
    let prompt = require_text(prompt, BLANK_PROMPT)?;
    Ok(ApiRequest::get(path).query("prompt", prompt))
}
