//! Error types for each controller plus the user-facing notification they
//! collapse into at the controller boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::in_flight::OpKind;

/// A failed round trip to the backend, as far as the controllers care.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApiError {
    #[error("request could not be built: {0}")]
    InvalidRequest(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "msg", alias = "error")]
    message: Option<String>,
}

impl ApiError {
    /// Builds a status error, reading the server's explanation from `body`:
    /// a `message` (or `msg`/`error`) JSON field, else short plain text.
    pub fn status(status: u16, body: &[u8]) -> Self {
        let from_json = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());

        let message = from_json.unwrap_or_else(|| match std::str::from_utf8(body) {
            Ok(text) if !text.trim().is_empty() && text.len() <= 200 => text.trim().to_string(),
            _ => format!("HTTP error: {status}"),
        });

        Self::Status { status, message }
    }
}

impl From<crux_http::HttpError> for ApiError {
    fn from(error: crux_http::HttpError) -> Self {
        match error {
            crux_http::HttpError::Http {
                code,
                message,
                body,
            } => {
                let status = u16::from(code);
                match body.as_deref() {
                    Some(body) if !body.is_empty() => Self::status(status, body),
                    _ => Self::Status { status, message },
                }
            }
            crux_http::HttpError::Timeout => Self::Timeout,
            crux_http::HttpError::Io(message) => Self::Network(message),
            crux_http::HttpError::Json(message) => Self::InvalidResponse(message),
            crux_http::HttpError::Url(message) => Self::InvalidRequest(message),
        }
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("rejected by server ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("login response did not contain a token")]
    MissingToken,

    #[error("another sign-in request is already in progress")]
    Busy,

    #[error(transparent)]
    Transport(ApiError),
}

impl AuthError {
    /// Classifies a failed `/login` or `/register` call.
    ///
    /// A 400 or 401 from `/login` means bad credentials; every other status
    /// is reported with the server's own message.
    #[must_use]
    pub fn from_api(error: ApiError, is_login: bool) -> Self {
        match error {
            ApiError::Status { status, .. } if is_login && (status == 400 || status == 401) => {
                Self::InvalidCredentials
            }
            ApiError::Status { status, message } => Self::Rejected { status, message },
            other => Self::Transport(other),
        }
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Invalid username or password.".into(),
            Self::Rejected { message, .. } => message.clone(),
            Self::MissingToken => "The server did not return a session token.".into(),
            Self::Busy => "Please wait for the current request to finish.".into(),
            Self::Transport(e) => transport_message(e),
        }
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum FetchError {
    #[error("not signed in")]
    NotAuthenticated,

    #[error("malformed case list: {0}")]
    Malformed(String),

    #[error(transparent)]
    Transport(ApiError),
}

impl FetchError {
    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Please log in to view cases.".into(),
            Self::Malformed(_) => "The server returned an unreadable case list.".into(),
            Self::Transport(e) => transport_message(e),
        }
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum MutationError {
    #[error("not signed in")]
    NotAuthenticated,

    #[error("{operation} already in progress")]
    Duplicate { operation: OpKind },

    #[error("no case is being edited")]
    NoDraft,

    #[error("malformed case in response: {0}")]
    Malformed(String),

    #[error(transparent)]
    Transport(ApiError),
}

impl MutationError {
    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Please log in to change cases.".into(),
            Self::Duplicate { .. } => "Please wait for the current request to finish.".into(),
            Self::NoDraft => "There is no case open for editing.".into(),
            Self::Malformed(_) => "The server returned an unreadable case.".into(),
            Self::Transport(e) => transport_message(e),
        }
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("invalid request timeout: {0}")]
    InvalidTimeout(String),
}

fn transport_message(error: &ApiError) -> String {
    match error {
        ApiError::Timeout => "The request timed out. Please try again.".into(),
        ApiError::Network(_) => {
            "Unable to reach the server. Please check your connection and try again.".into()
        }
        ApiError::Status { status: 401 | 403, .. } => {
            "The server rejected your session. Please log in again.".into()
        }
        ApiError::Status { status: 404, .. } => "The case could not be found.".into(),
        ApiError::Status { message, .. } => message.clone(),
        ApiError::InvalidResponse(_) => "The server returned an unexpected response.".into(),
        ApiError::InvalidRequest(reason) => format!("The request could not be prepared: {reason}"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

/// A dismissible message for the user. Only the latest one is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    #[must_use]
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    /// `"<context>: <detail>"`, the shape every failure notification takes.
    #[must_use]
    pub fn failure(context: &str, detail: &str) -> Self {
        Self::error(format!("{context}: {detail}"))
    }
}
