//! OpenAI-compatible stream parser
//!
//! Shared by every chat-completions provider (OpenAI, DeepSeek, OpenRouter,
//! AIML, Moonshot, ChatGLM, Azure, custom endpoints) and by the legacy text
//! completion endpoint.

use serde_json::Value;

use crate::ai::error::ApiError;
use crate::ai::sse::{parse_finish_reason, SseEvent, SseParser};
use crate::ai::types::FinishReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// `choices[0].delta.content`
    Chat,
    /// `choices[0].text`
    Completion,
}

/// OpenAI SSE parser
///
/// ```json
/// {"choices": [{"index": 0, "delta": {"content": "Hel"}, "finish_reason": null}]}
/// ```
pub struct OpenAIParser {
    shape: Shape,
    finish_reason: Option<FinishReason>,
}

impl OpenAIParser {
    pub fn chat() -> Self {
        Self {
            shape: Shape::Chat,
            finish_reason: None,
        }
    }

    pub fn completion() -> Self {
        Self {
            shape: Shape::Completion,
            finish_reason: None,
        }
    }

    fn delta_text<'a>(&self, choice: &'a Value) -> Option<&'a str> {
        match self.shape {
            Shape::Chat => choice
                .get("delta")
                .and_then(|d| d.get("content"))
                .and_then(|c| c.as_str()),
            Shape::Completion => choice.get("text").and_then(|t| t.as_str()),
        }
    }
}

impl SseParser for OpenAIParser {
    fn parse_event(&mut self, json: &Value) -> Result<SseEvent, ApiError> {
        if let Some(error) = json.get("error") {
            return Err(ApiError::from_payload(error));
        }

        // Azure sends content-filter preambles with an empty choices array
        let Some(choice) = json
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
        else {
            return Ok(SseEvent::Skip);
        };

        if let Some(reason) = choice.get("finish_reason").and_then(|r| r.as_str()) {
            self.finish_reason = Some(parse_finish_reason(reason));
        }

        match self.delta_text(choice) {
            Some(text) if !text.is_empty() => Ok(SseEvent::TextDelta(text.to_string())),
            _ => match &self.finish_reason {
                Some(reason) => Ok(SseEvent::Finish {
                    reason: reason.clone(),
                }),
                None => Ok(SseEvent::Skip),
            },
        }
    }

    fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_chat_delta() {
        let mut parser = OpenAIParser::chat();
        let event = parser
            .parse_event(&json!({"choices": [{"delta": {"content": "Hel"}, "finish_reason": null}]}))
            .unwrap();
        assert_eq!(event, SseEvent::TextDelta("Hel".into()));
    }

    #[test]
    fn test_role_only_delta_is_skipped() {
        let mut parser = OpenAIParser::chat();
        let event = parser
            .parse_event(&json!({"choices": [{"delta": {"role": "assistant"}}]}))
            .unwrap();
        assert_eq!(event, SseEvent::Skip);
    }

    #[test]
    fn test_empty_choices_skipped() {
        let mut parser = OpenAIParser::chat();
        let event = parser
            .parse_event(&json!({"choices": [], "prompt_filter_results": []}))
            .unwrap();
        assert_eq!(event, SseEvent::Skip);
    }

    #[test]
    fn test_finish_chunk() {
        let mut parser = OpenAIParser::chat();
        let event = parser
            .parse_event(&json!({"choices": [{"delta": {}, "finish_reason": "length"}]}))
            .unwrap();
        assert_eq!(
            event,
            SseEvent::Finish {
                reason: FinishReason::Length
            }
        );
    }

    #[test]
    fn test_text_with_finish_keeps_text_and_records_reason() {
        let mut parser = OpenAIParser::chat();
        let event = parser
            .parse_event(&json!({"choices": [{"delta": {"content": "end"}, "finish_reason": "stop"}]}))
            .unwrap();
        assert_eq!(event, SseEvent::TextDelta("end".into()));
        assert_eq!(parser.finish_reason(), Some(FinishReason::Stop));
    }

    #[test]
    fn test_completion_text() {
        let mut parser = OpenAIParser::completion();
        let event = parser
            .parse_event(&json!({"choices": [{"text": " world", "index": 0}]}))
            .unwrap();
        assert_eq!(event, SseEvent::TextDelta(" world".into()));
    }

    #[test]
    fn test_error_payload() {
        let mut parser = OpenAIParser::chat();
        let err = parser
            .parse_event(&json!({"error": {"message": "Rate limit reached", "type": "rate_limit_exceeded"}}))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::RateLimited);
        assert_eq!(err.message, "Rate limit reached");
    }
}
