use std::fmt;

use serde::{Deserialize, Serialize};

/// The lightweight profile kept alongside the token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Profile {
    pub fn new(username: impl Into<String>, email: Option<String>) -> Self {
        Profile {
            username: username.into(),
            email,
        }
    }
}

/// An established session: token, owning user id and profile, always together.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub token: String,
    pub user_id: String,
    pub profile: Profile,
}

impl SessionData {
    /// Create session data whose user id is the username.
    ///
    /// The backend identifies users by username, so this is the default
    /// ownership tag unless the auth response names an explicit id.
    pub fn new(token: impl Into<String>, profile: Profile) -> Self {
        SessionData {
            token: token.into(),
            user_id: profile.username.clone(),
            profile,
        }
    }

    /// Override the user id derived from the profile.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }
}

// Tokens grant access on possession, keep them out of logs.
impl fmt::Debug for SessionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionData")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("profile", &self.profile)
            .finish()
    }
}

/// The client-side authentication state.
///
/// Either empty (unauthenticated) or holding a complete `SessionData`; a token
/// without a profile cannot be represented.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    data: Option<SessionData>,
}

impl Session {
    /// The unauthenticated session.
    pub fn empty() -> Self {
        Session { data: None }
    }

    pub fn is_authenticated(&self) -> bool {
        self.data.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.token.as_str())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.user_id.as_str())
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.data.as_ref().map(|d| &d.profile)
    }
}

impl From<SessionData> for Session {
    fn from(data: SessionData) -> Self {
        Session { data: Some(data) }
    }
}
