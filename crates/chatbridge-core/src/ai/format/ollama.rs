//! Ollama native chat format handler

use serde_json::{json, Value};

use super::{check_error_body, missing_field, FormatHandler};
use crate::ai::client::config::CallOptions;
use crate::ai::error::ApiError;
use crate::ai::types::ChatMessage;

/// Ollama `/api/chat` format handler
///
/// Generation parameters live under `options`; `num_predict` is Ollama's
/// name for the output token limit.
#[derive(Debug, Default)]
pub struct OllamaFormat;

impl OllamaFormat {
    pub fn new() -> Self {
        Self
    }
}

impl FormatHandler for OllamaFormat {
    fn build_request_body(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &CallOptions,
    ) -> Value {
        let messages: Vec<Value> = messages
            .iter()
            .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
            .collect();
        json!({
            "model": model,
            "messages": messages,
            "stream": options.stream,
            "options": {
                "temperature": options.temperature,
                "num_predict": options.max_tokens,
            },
        })
    }

    fn extract_text(&self, response: &Value) -> Result<String, ApiError> {
        check_error_body(response)?;
        response
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| missing_field("message.content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_options() {
        let options = CallOptions {
            max_tokens: 256,
            temperature: 0.2,
            stream: true,
        };
        let body = OllamaFormat::new().build_request_body("llama4", &[ChatMessage::user("hi")], &options);
        assert_eq!(body["model"], "llama4");
        assert_eq!(body["options"]["num_predict"], 256);
        assert!(body.get("max_tokens").is_none());
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn test_extract() {
        let response = json!({"message": {"role": "assistant", "content": "ok"}, "done": true});
        assert_eq!(OllamaFormat::new().extract_text(&response).unwrap(), "ok");
        let err = OllamaFormat::new().extract_text(&json!({"error": "boom"})).unwrap_err();
        assert_eq!(err.message, "boom");
    }
}
