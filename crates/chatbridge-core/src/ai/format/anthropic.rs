//! Anthropic API format handler
//!
//! System turns move to the top-level `system` field. User and assistant
//! turns must alternate, so consecutive turns of the same role are merged.

use serde_json::{json, Value};

use super::{check_error_body, missing_field, FormatHandler};
use crate::ai::client::config::CallOptions;
use crate::ai::error::ApiError;
use crate::ai::types::{ChatMessage, Role};

/// Anthropic Messages format handler
#[derive(Debug, Default)]
pub struct AnthropicFormat;

impl AnthropicFormat {
    pub fn new() -> Self {
        Self
    }

    /// Split messages into the system prompt and alternating turns
    pub fn convert_messages(&self, messages: &[ChatMessage]) -> (Option<String>, Vec<Value>) {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        let system = (!system.is_empty()).then(|| system.join("\n\n"));

        let mut turns: Vec<(Role, String)> = Vec::new();
        for msg in messages.iter().filter(|m| m.role != Role::System) {
            match turns.last_mut() {
                Some((role, content)) if *role == msg.role => {
                    content.push_str("\n\n");
                    content.push_str(&msg.content);
                }
                _ => turns.push((msg.role, msg.content.clone())),
            }
        }

        let turns = turns
            .into_iter()
            .map(|(role, content)| json!({"role": role.as_str(), "content": content}))
            .collect();
        (system, turns)
    }
}

impl FormatHandler for AnthropicFormat {
    fn build_request_body(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &CallOptions,
    ) -> Value {
        let (system, turns) = self.convert_messages(messages);
        let mut body = json!({
            "model": model,
            "messages": turns,
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
            "stream": options.stream,
        });
        if let Some(system) = system {
            body["system"] = json!(system);
        }
        body
    }

    fn extract_text(&self, response: &Value) -> Result<String, ApiError> {
        check_error_body(response)?;
        let content = response
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| missing_field("content"))?;
        Ok(content
            .iter()
            .filter(|block| block.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_moves_to_top_level() {
        let messages = vec![
            ChatMessage::system("You are terse."),
            ChatMessage::user("hi"),
        ];
        let options = CallOptions {
            max_tokens: 2000,
            temperature: 1.0,
            stream: true,
        };
        let body = AnthropicFormat::new().build_request_body("claude-3-7-sonnet-20250219", &messages, &options);
        assert_eq!(body["system"], "You are terse.");
        assert_eq!(body["messages"], json!([{"role": "user", "content": "hi"}]));
        assert_eq!(body["max_tokens"], 2000);
    }

    #[test]
    fn test_consecutive_turns_merge() {
        let messages = vec![
            ChatMessage::user("a"),
            ChatMessage::user("b"),
            ChatMessage::assistant("c"),
            ChatMessage::user("d"),
        ];
        let (system, turns) = AnthropicFormat::new().convert_messages(&messages);
        assert!(system.is_none());
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0]["content"], "a\n\nb");
        assert_eq!(turns[1]["role"], "assistant");
    }

    #[test]
    fn test_extract_joins_text_blocks() {
        let response = json!({
            "content": [
                {"type": "text", "text": "Hel"},
                {"type": "tool_use", "id": "t"},
                {"type": "text", "text": "lo"}
            ],
            "stop_reason": "end_turn"
        });
        assert_eq!(AnthropicFormat::new().extract_text(&response).unwrap(), "Hello");
    }
}
