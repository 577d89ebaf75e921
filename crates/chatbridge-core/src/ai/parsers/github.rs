//! Stream parser for the self-hosted ChatGPT proxy (waylaidwanderer API)
//!
//! Tokens arrive as bare JSON strings. The closing `result` event carries
//! the complete response object and is informational only.

use serde_json::Value;

use crate::ai::error::ApiError;
use crate::ai::sse::{SseEvent, SseParser};

#[derive(Default)]
pub struct GithubProxyParser;

impl GithubProxyParser {
    pub fn new() -> Self {
        Self
    }
}

impl SseParser for GithubProxyParser {
    fn parse_event(&mut self, json: &Value) -> Result<SseEvent, ApiError> {
        match json {
            Value::String(token) if !token.is_empty() => Ok(SseEvent::TextDelta(token.clone())),
            Value::Object(obj) => match obj.get("error") {
                Some(error) => Err(ApiError::from_payload(error)),
                None => Ok(SseEvent::Skip),
            },
            _ => Ok(SseEvent::Skip),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_tokens() {
        let mut parser = GithubProxyParser::new();
        assert_eq!(
            parser.parse_event(&json!("Hello")).unwrap(),
            SseEvent::TextDelta("Hello".into())
        );
        assert_eq!(parser.parse_event(&json!("")).unwrap(), SseEvent::Skip);
    }

    #[test]
    fn test_result_object_skipped() {
        let mut parser = GithubProxyParser::new();
        let event = parser
            .parse_event(&json!({"response": "Hello world", "conversationId": "c1"}))
            .unwrap();
        assert_eq!(event, SseEvent::Skip);
    }

    #[test]
    fn test_error_object() {
        let mut parser = GithubProxyParser::new();
        let err = parser.parse_event(&json!({"error": "upstream closed"})).unwrap_err();
        assert_eq!(err.message, "upstream closed");
    }
}
