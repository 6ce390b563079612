use std::sync::Arc;

use figment::{
    providers::{Format, Yaml},
    Figment,
};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;
use spai_client::config::{extract_config, ConfigV1};
use spai_client::startup::build_context;
use spai_client::state::ClientContext;

/// A configuration pointing at `base_url` with a memory-backed session.
pub fn memory_config(base_url: &str) -> ConfigV1 {
    config_from_yaml(&format!(
        r#"
version: "1.0.0"
logging:
  level: "debug"
  format: "json"
backend:
  base_url: "{base_url}"
  timeout_in_ms: 3000
session:
  type: memory
"#
    ))
}

/// A configuration pointing at `base_url` with the session kept at `path`.
pub fn file_config(base_url: &str, path: &std::path::Path) -> ConfigV1 {
    config_from_yaml(&format!(
        r#"
version: "1.0.0"
backend:
  base_url: "{base_url}"
session:
  type: file
  path: "{}"
"#,
        path.display()
    ))
}

pub fn config_from_yaml(yaml: &str) -> ConfigV1 {
    let figment = Figment::from(Yaml::string(yaml));
    extract_config(&figment).expect("test configuration should parse")
}

pub async fn build_client(config: ConfigV1) -> ClientContext {
    build_context(Arc::new(config))
        .await
        .expect("client context should build")
}

/// Mock the backend accepting `username`/`password` and issuing `token`.
pub async fn mock_login(server: &mut ServerGuard, username: &str, password: &str, token: &str) -> Mock {
    server
        .mock("POST", "/api/auth/login")
        .match_body(Matcher::Json(json!({
            "usernameOrEmail": username,
            "password": password
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "message": "Login successful!",
                "success": true,
                "token": token,
                "username": username,
                "email": format!("{username}@example.com")
            })
            .to_string(),
        )
        .create_async()
        .await
}

/// Envelope around `data` the way the backend sends feature payloads.
pub fn envelope(data: serde_json::Value) -> String {
    json!({"success": true, "data": data, "timestamp": 1714558530000i64}).to_string()
}

pub fn saved_recipe(id: i64, user_id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "userId": user_id,
        "recipeText": "Whisk the eggs.",
        "ingredients": "eggs",
        "cuisine": "any",
        "dietaryRestrictions": null,
        "recipeName": "Omelette",
        "savedAt": "2024-05-01T10:15:30"
    })
}
