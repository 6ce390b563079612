use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::error::ApiError;

/// Where a request carries the session's user id, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserScope {
    #[default]
    None,
    /// Appended as a `userId` query parameter.
    Query,
    /// Set as the `userId` field of the JSON object body.
    Body,
}

/// Describes one call against the backend, before the session is applied.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub requires_auth: bool,
    pub user_scope: UserScope,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        ApiRequest {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            requires_auth: true,
            user_scope: UserScope::None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Adds the parameter only when `value` is present and not blank.
    pub fn query_opt(self, key: &str, value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Sent without the bearer token, e.g. the login call itself.
    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    pub fn scoped(mut self, scope: UserScope) -> Self {
        self.user_scope = scope;
        self
    }

    /// Tag the request with `user_id` according to its scope.
    ///
    /// A body that is not a JSON object is left untouched, as is a query that
    /// already names a `userId`.
    pub fn apply_user_scope(&mut self, user_id: &str) {
        match self.user_scope {
            UserScope::None => {}
            UserScope::Query => {
                if !self.query.iter().any(|(k, _)| k == "userId") {
                    self.query.push(("userId".to_string(), user_id.to_string()));
                }
            }
            UserScope::Body => {
                let body = self
                    .body
                    .get_or_insert_with(|| Value::Object(Default::default()));
                if let Value::Object(map) = body {
                    map.insert("userId".to_string(), Value::String(user_id.to_string()));
                }
            }
        }
    }
}
