//! API error taxonomy and the single response-to-message adapter.
//!
//! ERROR HANDLING
//! ==============
//! Every screen renders failures through `ApiError::user_message()`, so the
//! best-effort extraction of backend messages lives in exactly one place.
//! The backend answers errors as `{"error": ...}`, DRF `{"detail": ...}`, or
//! per-field validation maps like `{"code": ["..."]}`.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use serde_json::Value;

use crate::state::session::SessionError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid phone number: {0}")]
    InvalidPhone(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("session expired")]
    Unauthorized,
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid JSON payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("request cancelled")]
    Cancelled,
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    /// Build a status error from a non-success response body.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        Self::Status { status, message: error_message(status, body) }
    }

    /// HTTP status behind this error, when there was a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unauthorized => Some(401),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            Self::Unauthorized => "Session expired, please log in again".to_owned(),
            Self::InvalidPhone(_) => "Enter a valid phone number".to_owned(),
            Self::Http(e) if e.is_timeout() => "The server did not respond in time".to_owned(),
            Self::Http(_) => "Could not reach the server".to_owned(),
            other => other.to_string(),
        }
    }
}

/// Best-effort human message from a backend error body.
#[must_use]
pub fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| message_from_value(&v))
        .unwrap_or_else(|| format!("request failed with status {status}"))
}

fn message_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Array(items) => items.iter().find_map(message_from_value),
        Value::Object(map) => {
            for key in ["error", "detail", "message", "non_field_errors"] {
                if let Some(msg) = map.get(key).and_then(message_from_value) {
                    return Some(msg);
                }
            }
            map.iter()
                .find_map(|(field, v)| message_from_value(v).map(|msg| format!("{field}: {msg}")))
        }
        _ => None,
    }
}
