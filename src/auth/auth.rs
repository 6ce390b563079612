use std::sync::Arc;

use tracing::{info, warn};

use super::validation::{validate_login, ValidatedRegistration};
use crate::client::{ApiClient, ApiError, ApiRequest};
use crate::events::ClientEvent;
use crate::models::{AuthResponse, Profile, Session, SessionData};

pub const LOGIN_FALLBACK: &str = "Login failed. Please check your credentials.";
pub const REGISTER_FALLBACK: &str = "Registration failed. Please try again.";

/// Outcome of a successful login or registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSuccess {
    pub message: Option<String>,
    pub profile: Profile,
}

/// Establishes and ends sessions. The session store is the only state it
/// touches, and only after the backend accepted the credentials.
pub struct AuthService {
    api: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        AuthService { api }
    }

    pub async fn login(&self, username_or_email: &str, password: &str) -> Result<AuthSuccess, ApiError> {
        let credentials = validate_login(username_or_email, password)?;
        let request = ApiRequest::post("/api/auth/login").json(&credentials)?.public();
        self.authenticate(request, &credentials.username_or_email, LOGIN_FALLBACK)
            .await
    }

    pub async fn register(&self, registration: &ValidatedRegistration) -> Result<AuthSuccess, ApiError> {
        let request = ApiRequest::post("/api/auth/register")
            .json(registration.request())?
            .public();
        self.authenticate(request, registration.username(), REGISTER_FALLBACK)
            .await
    }

    /// Forget the current session. Always succeeds from the caller's view.
    pub async fn logout(&self) {
        if let Err(e) = self.api.store().clear().await {
            warn!(
                event_name = "auth.logout.clear_failed",
                event_domain = "auth",
                error = %e,
                "could not remove the stored session"
            );
        }
        info!(event_name = "auth.logout", event_domain = "auth", "logged out");
        self.api.events().publish(ClientEvent::LoggedOut);
    }

    pub async fn current_session(&self) -> Session {
        self.api.store().load().await
    }

    pub async fn current_profile(&self) -> Option<Profile> {
        self.current_session().await.profile().cloned()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current_session().await.is_authenticated()
    }

    async fn authenticate(
        &self,
        request: ApiRequest,
        identity: &str,
        fallback: &str,
    ) -> Result<AuthSuccess, ApiError> {
        let path = request.path.clone();
        let response: AuthResponse = match self.api.send_json(request).await {
            Ok(response) => response,
            Err(e) => {
                let e = e.with_fallback(fallback);
                info!(
                    event_name = "auth.rejected",
                    event_domain = "auth",
                    path = path.as_str(),
                    status = e.status(),
                    "authentication failed"
                );
                return Err(e);
            }
        };

        let message = response
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        if !response.success {
            return Err(ApiError::Rejected {
                status: 200,
                message: message.or_else(|| Some(fallback.to_string())),
            });
        }
        let token = response
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Decode("authentication response carried no token".to_string()))?;

        let username = response
            .username
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| identity.to_string());
        let profile = Profile::new(username, response.email);
        let mut session = SessionData::new(token, profile.clone());
        if let Some(user_id) = response.user_id.filter(|id| !id.is_empty()) {
            session = session.with_user_id(user_id);
        }
        self.api.store().save(&session).await?;

        info!(
            event_name = "auth.session.established",
            event_domain = "auth",
            username = profile.username.as_str(),
            store = self.api.store().describe(),
            "session established"
        );
        self.api.events().publish(ClientEvent::LoggedIn {
            username: profile.username.clone(),
        });
        Ok(AuthSuccess { message, profile })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::RegistrationForm;
    use crate::config::BackendConfig;
    use crate::events::EventBus;
    use crate::store::{MemoryStore, SessionStore};
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn service(url: &str, store: Arc<dyn SessionStore>) -> AuthService {
        let api = ApiClient::new(&BackendConfig::with_base_url(url), store, EventBus::default()).unwrap();
        AuthService::new(Arc::new(api))
    }

    #[tokio::test]
    async fn test_login_stores_session() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/api/auth/login")
            .match_body(Matcher::Json(json!({"usernameOrEmail": "alice", "password": "secret1"})))
            .with_status(200)
            .with_body(
                r#"{"message": "Login successful!", "success": true, "token": "T1",
                    "username": "alice", "email": "alice@example.com"}"#,
            )
            .create_async()
            .await;

        let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
        let auth = service(&server.url(), store.clone());
        let mut events = auth.api.events().subscribe();

        let success = auth.login("alice", "secret1").await.unwrap();
        m.assert_async().await;
        assert_eq!(success.message.as_deref(), Some("Login successful!"));
        assert_eq!(success.profile.username, "alice");

        let session = store.load().await;
        assert_eq!(session.token(), Some("T1"));
        assert_eq!(session.user_id(), Some("alice"));
        assert_eq!(
            session.profile().and_then(|p| p.email.as_deref()),
            Some("alice@example.com")
        );
        assert_eq!(
            events.try_recv().unwrap(),
            ClientEvent::LoggedIn {
                username: "alice".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_previous_session() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/auth/login")
            .with_status(401)
            .with_body(r#"{"message": "Invalid username/email or password!", "success": false}"#)
            .create_async()
            .await;

        let previous = SessionData::new("T0", Profile::new("carol", None));
        let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::with_session(previous.clone()));
        let auth = service(&server.url(), store.clone());

        let error = auth.login("alice", "wrong-password").await.unwrap_err();
        assert_eq!(error.user_message(), "Invalid username/email or password!");
        assert_eq!(store.load().await, Session::from(previous));
    }

    #[tokio::test]
    async fn test_login_without_message_uses_fallback() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/auth/login")
            .with_status(500)
            .create_async()
            .await;

        let auth = service(&server.url(), Arc::new(MemoryStore::new()));
        let error = auth.login("alice", "secret1").await.unwrap_err();
        assert_eq!(error.user_message(), LOGIN_FALLBACK);
        assert!(!auth.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_blank_login_is_not_sent() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/api/auth/login")
            .expect(0)
            .create_async()
            .await;

        let auth = service(&server.url(), Arc::new(MemoryStore::new()));
        assert!(matches!(
            auth.login("alice", "").await,
            Err(ApiError::Validation(_))
        ));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_success_flag_false_is_a_failure() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/auth/login")
            .with_status(200)
            .with_body(r#"{"success": false}"#)
            .create_async()
            .await;

        let auth = service(&server.url(), Arc::new(MemoryStore::new()));
        let error = auth.login("alice", "secret1").await.unwrap_err();
        assert_eq!(error.user_message(), LOGIN_FALLBACK);
        assert!(!auth.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_register_establishes_session() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/api/auth/register")
            .match_body(Matcher::Json(json!({
                "username": "bob",
                "email": "bob@example.com",
                "password": "hunter22",
                "fullName": "Bob Builder"
            })))
            .with_status(200)
            .with_body(
                r#"{"message": "User registered successfully!", "success": true,
                    "token": "T9", "username": "bob", "email": "bob@example.com"}"#,
            )
            .create_async()
            .await;

        let auth = service(&server.url(), Arc::new(MemoryStore::new()));
        let registration = RegistrationForm {
            full_name: "Bob Builder".to_string(),
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            password: "hunter22".to_string(),
            confirm_password: "hunter22".to_string(),
        }
        .validate()
        .unwrap();

        auth.register(&registration).await.unwrap();
        m.assert_async().await;
        assert_eq!(auth.current_session().await.token(), Some("T9"));
        assert_eq!(
            auth.current_profile().await.map(|p| p.username),
            Some("bob".to_string())
        );
    }

    #[tokio::test]
    async fn test_register_conflict_message() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/auth/register")
            .with_status(400)
            .with_body(r#"{"message": "Username is already taken!", "success": false}"#)
            .create_async()
            .await;

        let auth = service(&server.url(), Arc::new(MemoryStore::new()));
        let registration = RegistrationForm {
            full_name: "Bob".to_string(),
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            password: "hunter22".to_string(),
            confirm_password: "hunter22".to_string(),
        }
        .validate()
        .unwrap();
        let error = auth.register(&registration).await.unwrap_err();
        assert_eq!(error.status(), Some(400));
        assert_eq!(error.user_message(), "Username is already taken!");
    }

    #[tokio::test]
    async fn test_explicit_user_id_is_kept() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/auth/login")
            .with_status(200)
            .with_body(r#"{"success": true, "token": "T1", "username": "alice", "userId": "u-17"}"#)
            .create_async()
            .await;

        let auth = service(&server.url(), Arc::new(MemoryStore::new()));
        auth.login("alice@example.com", "secret1").await.unwrap();
        assert_eq!(auth.current_session().await.user_id(), Some("u-17"));
    }

    #[tokio::test]
    async fn test_logout_clears_and_notifies() {
        let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::with_session(SessionData::new(
            "T1",
            Profile::new("alice", None),
        )));
        let auth = service("http://127.0.0.1:9", store.clone());
        let mut events = auth.api.events().subscribe();

        auth.logout().await;
        auth.logout().await;

        assert!(!store.load().await.is_authenticated());
        assert_eq!(events.try_recv().unwrap(), ClientEvent::LoggedOut);
    }
}
