//! Ollama native chat stream parser (NDJSON)

use serde_json::Value;

use crate::ai::error::ApiError;
use crate::ai::sse::{parse_finish_reason, SseEvent, SseParser};
use crate::ai::types::FinishReason;

/// Parses `{"message": {"content": ..}, "done": bool, "done_reason": ..}` lines
#[derive(Default)]
pub struct OllamaParser {
    finish_reason: Option<FinishReason>,
}

impl OllamaParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SseParser for OllamaParser {
    fn parse_event(&mut self, json: &Value) -> Result<SseEvent, ApiError> {
        if let Some(error) = json.get("error") {
            return Err(ApiError::from_payload(error));
        }

        let done = json.get("done").and_then(|d| d.as_bool()).unwrap_or(false);
        if done {
            let reason = json
                .get("done_reason")
                .and_then(|r| r.as_str())
                .map(parse_finish_reason)
                .unwrap_or(FinishReason::Stop);
            self.finish_reason = Some(reason);
        }

        let text = json
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .unwrap_or("");

        if !text.is_empty() {
            return Ok(SseEvent::TextDelta(text.to_string()));
        }
        match &self.finish_reason {
            Some(reason) => Ok(SseEvent::Finish {
                reason: reason.clone(),
            }),
            None => Ok(SseEvent::Skip),
        }
    }

    fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason.clone()
    }
}
