//! API Format handling
//!
//! Abstracts the request and response shapes of the wire formats the
//! providers speak: OpenAI chat/completions, OpenAI text completions,
//! Anthropic Messages and Ollama's native chat API.

pub mod anthropic;
pub mod ollama;
pub mod openai;

use serde_json::Value;

use crate::ai::client::config::CallOptions;
use crate::ai::error::ApiError;
use crate::ai::types::ChatMessage;

/// Trait for handling different API formats
///
/// Implementations convert the normalized conversation into a provider
/// request body and pull the answer text out of a non-streamed response.
pub trait FormatHandler: Send + Sync {
    /// Build the complete request body
    fn build_request_body(&self, model: &str, messages: &[ChatMessage], options: &CallOptions)
        -> Value;

    /// Extract the answer from a complete (non-streamed) response
    fn extract_text(&self, response: &Value) -> Result<String, ApiError>;
}

/// Fail with the body's embedded error, if any
pub(crate) fn check_error_body(response: &Value) -> Result<(), ApiError> {
    match response.get("error") {
        Some(Value::Null) | None => Ok(()),
        Some(error) => Err(ApiError::from_payload(error)),
    }
}

/// Error for a response body missing the expected text field
pub(crate) fn missing_field(path: &str) -> ApiError {
    ApiError::protocol(format!("response has no `{}`", path))
}
