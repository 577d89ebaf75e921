//! OpenAI API format handlers
//!
//! `OpenAIFormat` builds chat/completions requests. `CompletionFormat`
//! flattens the conversation into a single prompt for the legacy
//! `/v1/completions` endpoint.

use serde_json::{json, Value};

use super::{check_error_body, missing_field, FormatHandler};
use crate::ai::client::config::CallOptions;
use crate::ai::error::ApiError;
use crate::ai::models;
use crate::ai::types::{ChatMessage, Role};

/// Opening line of every text-completion prompt
pub const COMPLETION_PROMPT_BASE: &str = "You are a helpful, creative, clever, and very friendly assistant. You are familiar with various languages in the world.\n";

/// OpenAI chat/completions format handler
#[derive(Debug, Default)]
pub struct OpenAIFormat;

impl OpenAIFormat {
    pub fn new() -> Self {
        Self
    }

    /// Convert messages to `{role, content}` objects
    pub fn convert_messages(&self, messages: &[ChatMessage]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role.as_str(),
                    "content": msg.content,
                })
            })
            .collect()
    }
}

impl FormatHandler for OpenAIFormat {
    fn build_request_body(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &CallOptions,
    ) -> Value {
        // Reasoning models reject max_tokens and any non-default temperature
        if models::is_reasoning_model(model) {
            return json!({
                "model": model,
                "messages": self.convert_messages(messages),
                "stream": options.stream,
                "max_completion_tokens": options.max_tokens,
            });
        }
        json!({
            "model": model,
            "messages": self.convert_messages(messages),
            "stream": options.stream,
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
        })
    }

    fn extract_text(&self, response: &Value) -> Result<String, ApiError> {
        check_error_body(response)?;
        let choices = response
            .get("choices")
            .and_then(|c| c.as_array())
            .ok_or_else(|| missing_field("choices"))?;

        // Azure may return an empty choices array when the content filter trips
        let Some(choice) = choices.first() else {
            return Ok(String::new());
        };
        choice
            .get("message")
            .and_then(|m| m.get("content"))
            .map(|c| c.as_str().unwrap_or_default().to_string())
            .ok_or_else(|| missing_field("choices[0].message.content"))
    }
}

/// OpenAI legacy text completion format handler
#[derive(Debug, Default)]
pub struct CompletionFormat;

impl CompletionFormat {
    pub fn new() -> Self {
        Self
    }

    /// Render the conversation as a Human/AI transcript ending in an open AI turn
    pub fn build_prompt(&self, messages: &[ChatMessage]) -> String {
        let mut prompt = String::from(COMPLETION_PROMPT_BASE);
        for msg in messages {
            match msg.role {
                Role::System => {
                    prompt.push_str(&msg.content);
                    prompt.push('\n');
                }
                Role::User => {
                    prompt.push_str("Human: ");
                    prompt.push_str(&msg.content);
                    prompt.push('\n');
                }
                Role::Assistant => {
                    prompt.push_str("AI: ");
                    prompt.push_str(&msg.content);
                    prompt.push('\n');
                }
            }
        }
        prompt.push_str("AI: ");
        prompt
    }
}

impl FormatHandler for CompletionFormat {
    fn build_request_body(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &CallOptions,
    ) -> Value {
        json!({
            "model": model,
            "prompt": self.build_prompt(messages),
            "stream": options.stream,
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
            "stop": ["\nHuman"],
        })
    }

    fn extract_text(&self, response: &Value) -> Result<String, ApiError> {
        check_error_body(response)?;
        response
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|c| c.get("text"))
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .ok_or_else(|| missing_field("choices[0].text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::error::ErrorKind;

    fn options(stream: bool) -> CallOptions {
        CallOptions {
            max_tokens: 100,
            temperature: 0.5,
            stream,
        }
    }

    #[test]
    fn test_chat_body() {
        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
            ChatMessage::user("how are you"),
        ];
        let body = OpenAIFormat::new().build_request_body("gpt-4o", &messages, &options(true));
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 100);
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["messages"].as_array().unwrap().len(), 4);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][3]["content"], "how are you");
    }

    #[test]
    fn test_reasoning_chat_body() {
        let messages = [ChatMessage::user("hi")];
        for model in ["gpt-5", "gpt-5-mini", "openai/o3"] {
            let body = OpenAIFormat::new().build_request_body(model, &messages, &options(true));
            assert_eq!(body["max_completion_tokens"], 100, "{}", model);
            assert!(body.get("max_tokens").is_none(), "{}", model);
            assert!(body.get("temperature").is_none(), "{}", model);
        }
    }

    #[test]
    fn test_chat_extract() {
        let response = json!({"choices": [{"message": {"role": "assistant", "content": "Hello"}}]});
        assert_eq!(OpenAIFormat::new().extract_text(&response).unwrap(), "Hello");

        let empty = json!({"choices": []});
        assert_eq!(OpenAIFormat::new().extract_text(&empty).unwrap(), "");

        let broken = json!({"id": "x"});
        assert_eq!(
            OpenAIFormat::new().extract_text(&broken).unwrap_err().kind,
            ErrorKind::ProtocolError
        );
    }

    #[test]
    fn test_completion_prompt() {
        let messages = vec![
            ChatMessage::user("q1"),
            ChatMessage::assistant("a1"),
            ChatMessage::user("q2"),
        ];
        let format = CompletionFormat::new();
        let prompt = format.build_prompt(&messages);
        assert!(prompt.starts_with(COMPLETION_PROMPT_BASE));
        assert!(prompt.ends_with("Human: q1\nAI: a1\nHuman: q2\nAI: "));

        let body = format.build_request_body("gpt-3.5-turbo-instruct", &messages, &options(false));
        assert_eq!(body["stop"], json!(["\nHuman"]));
        assert_eq!(body["stream"], false);
        assert!(body.get("messages").is_none());
    }

    #[test]
    fn test_completion_extract() {
        let response = json!({"choices": [{"text": " fine", "finish_reason": "stop"}]});
        assert_eq!(CompletionFormat::new().extract_text(&response).unwrap(), " fine");
    }
}
