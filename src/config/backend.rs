use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_in_ms() -> u64 {
    // The backend gives up on slow generations after 60 seconds.
    60_000
}

fn default_attach_user_id() -> bool {
    true
}

/// Where the backend lives and how requests to it behave.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_in_ms")]
    pub timeout_in_ms: u64,
    /// Tag user-scoped requests with the session's user id in addition to the
    /// bearer token. Turn off for a backend that derives ownership from the
    /// token alone.
    #[serde(default = "default_attach_user_id")]
    pub attach_user_id: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            base_url: default_base_url(),
            timeout_in_ms: default_timeout_in_ms(),
            attach_user_id: default_attach_user_id(),
        }
    }
}

impl BackendConfig {
    /// Config pointing at `base_url` with every other field defaulted.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        BackendConfig {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}
