//! Error taxonomy for provider calls
//!
//! Every failure inside an adapter ends up as an `ApiError`, which the
//! stream sink turns into the terminal `Error` event.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use super::retry::backoff::IsRetryable;
use crate::constants;

/// Normalized failure class surfaced to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// 401/403 or a missing API key
    AuthError,
    /// 429
    RateLimited,
    /// Any other 4xx
    BadRequest,
    /// 5xx
    ServerError,
    /// Transport failure (DNS, connect, reset, timeout)
    NetworkError,
    /// Response body or stream frame could not be understood
    ProtocolError,
    /// Required URL or setting is missing
    ConfigError,
    /// No adapter registered for the classified family
    UnsupportedModel,
}

impl ErrorKind {
    /// Map an HTTP status code to an error kind
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ErrorKind::AuthError,
            429 => ErrorKind::RateLimited,
            400..=499 => ErrorKind::BadRequest,
            500..=599 => ErrorKind::ServerError,
            _ => ErrorKind::ProtocolError,
        }
    }

    /// Only rate limits and transport failures are worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::RateLimited | ErrorKind::NetworkError)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::AuthError => "AuthError",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::ServerError => "ServerError",
            ErrorKind::NetworkError => "NetworkError",
            ErrorKind::ProtocolError => "ProtocolError",
            ErrorKind::ConfigError => "ConfigError",
            ErrorKind::UnsupportedModel => "UnsupportedModel",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified provider failure
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    /// HTTP status, when the failure came from a response
    pub status: Option<u16>,
    /// Server-provided Retry-After hint
    pub retry_after: Option<Duration>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            retry_after: None,
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthError, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigError, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProtocolError, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkError, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedModel, message)
    }

    /// Build an error from a non-success HTTP response
    pub fn from_response(status: u16, body: &str, retry_after: Option<Duration>) -> Self {
        let kind = ErrorKind::from_status(status);
        let detail = extract_error_message(body);
        let message = if detail.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, detail)
        };
        Self {
            kind,
            message,
            status: Some(status),
            retry_after,
        }
    }

    /// Build an error from an error object embedded in a stream or body
    ///
    /// Providers report mid-stream failures as JSON (`{"error": {...}}`); the
    /// `type`/`code` field picks the kind when it is recognizable.
    pub fn from_payload(error: &Value) -> Self {
        let message = error_text(error).unwrap_or_else(|| error.to_string());
        let hint = error
            .get("type")
            .or_else(|| error.get("code"))
            .map(|v| match v {
                Value::String(s) => s.to_lowercase(),
                other => other.to_string(),
            })
            .unwrap_or_default();

        let kind = if hint.contains("rate_limit") || hint.contains("429") {
            ErrorKind::RateLimited
        } else if hint.contains("auth") || hint.contains("permission") || hint == "401" {
            ErrorKind::AuthError
        } else if hint.contains("overloaded") || hint.contains("server") || hint.contains("api_error") {
            ErrorKind::ServerError
        } else if hint.contains("invalid_request") || hint.contains("not_found") {
            ErrorKind::BadRequest
        } else {
            ErrorKind::ServerError
        };
        Self::new(kind, message)
    }

    /// Whether the caller may offer a retry
    pub fn retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl IsRetryable for ApiError {
    fn is_retryable(&self) -> bool {
        self.retryable()
    }

    fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ApiError::protocol(err.to_string());
        }
        if let Some(status) = err.status() {
            return ApiError::from_response(status.as_u16(), "", None);
        }
        if err.is_builder() {
            return ApiError::config(err.to_string());
        }
        ApiError::network(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::protocol(err.to_string())
    }
}

/// Pull a human-readable message out of a provider error body
///
/// Understands the common shapes: `{"error": {"message": ..}}`,
/// `{"error": ".."}`, `{"message": ..}` and `{"detail": ..}`. Falls back to
/// the raw body, truncated.
pub fn extract_error_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if let Ok(json) = serde_json::from_str::<Value>(trimmed) {
        let candidate = json.get("error").unwrap_or(&json);
        if let Some(text) = error_text(candidate) {
            return text;
        }
    }
    truncate(trimmed, constants::http::MAX_ERROR_BODY_CHARS)
}

fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => ["message", "error", "detail", "msg"]
            .iter()
            .find_map(|key| value.get(*key))
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                nested @ Value::Object(_) => error_text(nested),
                _ => None,
            }),
        _ => None,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
