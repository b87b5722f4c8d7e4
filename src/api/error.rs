//! API Error Types
//!
//! Every failure the backend client can report, as one closed enum.
//! Callers match on the variant; nothing inspects message text.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors returned by the MindCare API client
#[derive(Error, Debug)]
pub enum ApiError {
    /// No bearer token available for an authenticated call
    #[error("Not signed in")]
    NotAuthenticated,

    /// 401: bad credentials or expired token
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// 403: the account is blocked or inactive
    #[error("Account blocked: {0}")]
    AccountBlocked(String),

    /// 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other 4xx
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// 5xx
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The request exceeded the configured timeout
    #[error("Request timeout")]
    Timeout,

    /// Could not connect to the backend
    #[error("Backend unreachable")]
    Unreachable,

    /// Other transport failure
    #[error("Request failed: {0}")]
    Request(reqwest::Error),

    /// The response body did not match the expected schema
    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Error body sent by the backend (`{"detail": "..."}`)
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Best human-readable text in the body
    pub fn text(&self) -> Option<String> {
        match &self.detail {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => self.message.clone(),
        }
    }
}

impl ApiError {
    /// Classify a non-success HTTP response by status code
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ApiError::InvalidCredentials(message),
            StatusCode::FORBIDDEN => ApiError::AccountBlocked(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            s if s.is_server_error() => ApiError::Server {
                status: s.as_u16(),
                message,
            },
            s => ApiError::Rejected {
                status: s.as_u16(),
                message,
            },
        }
    }

    /// Classify a raw error body. Falls back to the status reason when the
    /// body carries no readable text.
    ///
    /// A 5xx whose detail carries a wrapped 4xx status (`"...: 401: ..."`)
    /// is classified by the wrapped status.
    pub fn from_body(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.text())
            .filter(|m| !m.is_empty())
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });

        if status.is_server_error() {
            if let Some((inner, detail)) = unwrap_status(&message) {
                return Self::from_status(inner, detail);
            }
        }

        Self::from_status(status, message)
    }

    /// Message shown on the login screen
    pub fn login_message(&self) -> &'static str {
        match self {
            ApiError::InvalidCredentials(_) | ApiError::NotFound(_) => {
                "Invalid email or password. Please try again."
            }
            ApiError::AccountBlocked(_) => {
                "Your account is blocked or inactive. Please contact support."
            }
            ApiError::Rejected { .. } => "Please check your details and try again.",
            ApiError::Timeout | ApiError::Unreachable | ApiError::Request(_) => {
                "Unable to reach MindCare. Check your connection and try again."
            }
            ApiError::Server { .. } | ApiError::Decode(_) => {
                "Something went wrong on our side. Please try again later."
            }
            ApiError::NotAuthenticated => "Please sign in to continue.",
        }
    }

    /// Whether the stored credential should be discarded
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ApiError::NotAuthenticated | ApiError::InvalidCredentials(_) | ApiError::AccountBlocked(_)
        )
    }
}

/// Client error re-raised by the backend as a 500, e.g.
/// `Internal server error: 401: Incorrect username or password`
fn unwrap_status(message: &str) -> Option<(StatusCode, String)> {
    let rest = message
        .strip_prefix("Internal server error:")
        .unwrap_or(message)
        .trim_start();
    let (code, detail) = rest.split_once(':')?;
    if code.len() != 3 {
        return None;
    }
    let status = StatusCode::from_u16(code.parse().ok()?).ok()?;
    if !status.is_client_error() {
        return None;
    }

    let detail = detail.trim();
    let detail = if detail.is_empty() {
        status.canonical_reason().unwrap_or("Unknown error")
    } else {
        detail
    };
    Some((status, detail.to_string()))
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_connect() {
            ApiError::Unreachable
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Request(e)
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
