use reqwest::StatusCode;

use crate::store::StoreError;

pub const NETWORK_MESSAGE: &str = "Cannot reach the backend. Make sure the server is running.";
pub const TIMEOUT_MESSAGE: &str = "The backend took too long to answer. Please try again.";
pub const SERVER_FALLBACK: &str = "The server could not complete the request. Please try again.";
pub const REJECTED_FALLBACK: &str = "The request was rejected.";
pub const UNAUTHORIZED_FALLBACK: &str = "Your session has expired. Please log in again.";
pub const FORBIDDEN_FALLBACK: &str = "You don't have permission to do that.";
pub const DECODE_MESSAGE: &str = "The server sent a response that could not be read.";

/// Every failure a public operation can report.
///
/// Variants follow the order a request can fail in: before sending
/// (validation), without a response (network, timeout, cancelled), or with
/// one (unauthorized, rejected, server, decode).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("request body could not be encoded: {0}")]
    Encode(String),
    #[error("backend unreachable: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("request cancelled")]
    Cancelled,
    #[error("unauthorized ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Unauthorized { status: u16, message: Option<String> },
    #[error("rejected ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { status: u16, message: Option<String> },
    #[error("server error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("session storage failed: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Classify an HTTP failure status with the message the backend sent.
    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        let code = status.as_u16();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized {
                status: code,
                message,
            },
            s if s.is_server_error() => ApiError::Server {
                status: code,
                message,
            },
            _ => ApiError::Rejected {
                status: code,
                message,
            },
        }
    }

    pub(crate) fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ApiError::Timeout
        } else if error.is_decode() {
            ApiError::Decode(error.to_string())
        } else {
            ApiError::Network(error.to_string())
        }
    }

    /// True when the caller should send the user back to the login screen.
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::Unauthorized { status: 401, .. })
    }

    /// The HTTP status, when the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { status, .. }
            | ApiError::Rejected { status, .. }
            | ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when no response was received at all.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout)
    }

    /// Fill in `fallback` where the backend answered without a message.
    pub fn with_fallback(self, fallback: &str) -> Self {
        match self {
            ApiError::Unauthorized { status, message } => ApiError::Unauthorized {
                status,
                message: message.or_else(|| Some(fallback.to_string())),
            },
            ApiError::Rejected { status, message } => ApiError::Rejected {
                status,
                message: message.or_else(|| Some(fallback.to_string())),
            },
            ApiError::Server { status, message } => ApiError::Server {
                status,
                message: message.or_else(|| Some(fallback.to_string())),
            },
            other => other,
        }
    }

    /// A message suitable for showing to the user.
    ///
    /// Backend-provided text wins; otherwise a generic message per kind.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(message) => message.clone(),
            ApiError::Encode(_) | ApiError::Decode(_) => DECODE_MESSAGE.to_string(),
            ApiError::Network(_) => NETWORK_MESSAGE.to_string(),
            ApiError::Timeout => TIMEOUT_MESSAGE.to_string(),
            ApiError::Cancelled => "The request was cancelled.".to_string(),
            ApiError::Unauthorized { status, message } => message.clone().unwrap_or_else(|| {
                if *status == 401 {
                    UNAUTHORIZED_FALLBACK.to_string()
                } else {
                    FORBIDDEN_FALLBACK.to_string()
                }
            }),
            ApiError::Rejected { message, .. } => message
                .clone()
                .unwrap_or_else(|| REJECTED_FALLBACK.to_string()),
            ApiError::Server { message, .. } => message
                .clone()
                .unwrap_or_else(|| SERVER_FALLBACK.to_string()),
            ApiError::Store(_) => "Could not save your session locally.".to_string(),
        }
    }
}
