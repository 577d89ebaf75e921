//! Adapter for a self-hosted ChatGPT proxy (waylaidwanderer node-chatgpt-api)
//!
//! The proxy keeps its own conversation state, so only the newest user
//! message is sent.

use serde_json::{json, Value};

use super::{require_base, ProviderAdapter};
use crate::ai::client::config::{AiClientConfig, CallOptions};
use crate::ai::error::ApiError;
use crate::ai::format::{check_error_body, missing_field};
use crate::ai::parsers::GithubProxyParser;
use crate::ai::providers::{AuthHeader, ProviderFamily};
use crate::ai::sse::SseParser;
use crate::ai::types::{ChatMessage, Role};

#[derive(Debug, Clone, Copy, Default)]
pub struct GithubProxyAdapter;

impl ProviderAdapter for GithubProxyAdapter {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::GithubProxy
    }

    fn auth_header(&self) -> AuthHeader {
        AuthHeader::None
    }

    fn requires_api_key(&self) -> bool {
        false
    }

    fn endpoint(&self, config: &AiClientConfig) -> Result<String, ApiError> {
        require_base(config).map(str::to_string)
    }

    fn build_body(
        &self,
        _config: &AiClientConfig,
        messages: &[ChatMessage],
        options: &CallOptions,
    ) -> Value {
        let message = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        json!({
            "message": message,
            "stream": options.stream,
        })
    }

    fn parser(&self) -> Box<dyn SseParser> {
        Box::new(GithubProxyParser::new())
    }

    fn parse_batch(&self, response: &Value) -> Result<String, ApiError> {
        check_error_body(response)?;
        response
            .get("response")
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .ok_or_else(|| missing_field("response"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sends_latest_user_message() {
        let config = AiClientConfig::new(ProviderFamily::GithubProxy, "", "http://127.0.0.1:3000/conversation");
        let messages = vec![
            ChatMessage::user("old"),
            ChatMessage::assistant("reply"),
            ChatMessage::user("new"),
        ];
        let body = GithubProxyAdapter.build_body(&config, &messages, &CallOptions::default());
        assert_eq!(body, json!({"message": "new", "stream": true}));
    }

    #[test]
    fn test_parse_batch() {
        let response = json!({"response": "Hello", "conversationId": "c"});
        assert_eq!(GithubProxyAdapter.parse_batch(&response).unwrap(), "Hello");
    }
}
