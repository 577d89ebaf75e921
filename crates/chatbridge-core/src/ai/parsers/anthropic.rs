//! Anthropic Messages API stream parser

use serde_json::Value;

use crate::ai::error::ApiError;
use crate::ai::sse::{parse_finish_reason, SseEvent, SseParser};
use crate::ai::types::FinishReason;

/// Parses `content_block_delta`, `message_delta`, `message_stop` and `error`
/// events. The stop reason arrives in `message_delta` and is reported when
/// `message_stop` closes the stream.
#[derive(Default)]
pub struct AnthropicParser {
    stop_reason: Option<FinishReason>,
}

impl AnthropicParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SseParser for AnthropicParser {
    fn parse_event(&mut self, json: &Value) -> Result<SseEvent, ApiError> {
        let event_type = json.get("type").and_then(|t| t.as_str()).unwrap_or("");

        match event_type {
            "content_block_delta" => {
                let delta = json.get("delta");
                let is_text = delta
                    .and_then(|d| d.get("type"))
                    .and_then(|t| t.as_str())
                    .map_or(true, |t| t == "text_delta");
                match delta.and_then(|d| d.get("text")).and_then(|t| t.as_str()) {
                    Some(text) if is_text && !text.is_empty() => {
                        Ok(SseEvent::TextDelta(text.to_string()))
                    }
                    _ => Ok(SseEvent::Skip),
                }
            }
            "message_delta" => {
                if let Some(reason) = json
                    .get("delta")
                    .and_then(|d| d.get("stop_reason"))
                    .and_then(|r| r.as_str())
                {
                    self.stop_reason = Some(parse_finish_reason(reason));
                }
                Ok(SseEvent::Skip)
            }
            "message_stop" => Ok(SseEvent::Finish {
                reason: self.stop_reason.clone().unwrap_or(FinishReason::Stop),
            }),
            "error" => Err(ApiError::from_payload(json.get("error").unwrap_or(json))),
            _ => Ok(SseEvent::Skip),
        }
    }

    fn finish_reason(&self) -> Option<FinishReason> {
        self.stop_reason.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_full_message_sequence() {
        let mut parser = AnthropicParser::new();
        let events: Vec<SseEvent> = [
            json!({"type": "message_start", "message": {"id": "msg_1"}}),
            json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
            json!({"type": "ping"}),
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Hi"}}),
            json!({"type": "content_block_stop", "index": 0}),
            json!({"type": "message_delta", "delta": {"stop_reason": "max_tokens"}}),
            json!({"type": "message_stop"}),
        ]
        .iter()
        .map(|e| parser.parse_event(e).unwrap())
        .collect();

        assert_eq!(
            events,
            vec![
                SseEvent::Skip,
                SseEvent::Skip,
                SseEvent::Skip,
                SseEvent::TextDelta("Hi".into()),
                SseEvent::Skip,
                SseEvent::Skip,
                SseEvent::Finish {
                    reason: FinishReason::Length
                },
            ]
        );
    }

    #[test]
    fn test_non_text_delta_skipped() {
        let mut parser = AnthropicParser::new();
        let event = parser
            .parse_event(&json!({"type": "content_block_delta", "delta": {"type": "input_json_delta", "partial_json": "{"}}))
            .unwrap();
        assert_eq!(event, SseEvent::Skip);
    }

    #[test]
    fn test_overloaded_error() {
        let mut parser = AnthropicParser::new();
        let err = parser
            .parse_event(&json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServerError);
        assert_eq!(err.message, "Overloaded");
    }
}
