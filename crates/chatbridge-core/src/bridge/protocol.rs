//! Bridge frames
//!
//! Requests are `{"type":"GENERATE","session":{...}}` or `{"type":"STOP"}`.
//! Responses are serialized `StreamEvent`s.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::ai::streaming::StreamEvent;
use crate::session::Session;

/// Message from the UI side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    /// Start a generation, replacing any live stream on the port
    Generate { session: Session },
    /// Cancel the live stream
    Stop,
}

/// Frame decoding and port errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("frame has no type")]
    MissingType,

    /// Legacy web-session frames that are no longer served
    #[error("unsupported frame type: {0}")]
    Unsupported(String),

    #[error("unknown frame type: {0}")]
    UnknownType(String),

    #[error("port disconnected")]
    Disconnected,
}

/// Decode one request frame
pub fn decode_request(frame: &str) -> Result<Request, ProtocolError> {
    let value: Value = serde_json::from_str(frame)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingType)?;
    match kind {
        "GENERATE" | "STOP" => Ok(serde_json::from_value(value)?),
        "FEEDBACK" | "DELETE_CONVERSATION" => Err(ProtocolError::Unsupported(kind.to_string())),
        other => Err(ProtocolError::UnknownType(other.to_string())),
    }
}

pub fn encode_event(event: &StreamEvent) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(event)?)
}

pub fn decode_event(frame: &str) -> Result<StreamEvent, ProtocolError> {
    Ok(serde_json::from_str(frame)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::error::ErrorKind;
    use crate::ai::types::FinishReason;

    #[test]
    fn test_decode_generate() {
        let frame = r#"{"type":"GENERATE","session":{"modelKey":"chatgptApi5","prompt":"hi"}}"#;
        let Request::Generate { session } = decode_request(frame).unwrap() else {
            panic!("expected GENERATE");
        };
        assert_eq!(session.model_key, "chatgptApi5");
        assert_eq!(session.prompt, "hi");
        assert!(session.api_mode.is_none());
    }

    #[test]
    fn test_decode_stop() {
        assert_eq!(decode_request(r#"{"type":"STOP"}"#).unwrap(), Request::Stop);
    }

    #[test]
    fn test_legacy_frames_rejected() {
        for frame in [
            r#"{"type":"FEEDBACK","data":{"rating":1}}"#,
            r#"{"type":"DELETE_CONVERSATION","conversationId":"abc"}"#,
        ] {
            assert!(matches!(decode_request(frame), Err(ProtocolError::Unsupported(_))));
        }
    }

    #[test]
    fn test_bad_frames() {
        assert!(matches!(decode_request("not json"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(decode_request(r#"{"session":{}}"#), Err(ProtocolError::MissingType)));
        assert!(matches!(decode_request(r#"{"type":"PING"}"#), Err(ProtocolError::UnknownType(_))));
        assert!(matches!(
            decode_request(r#"{"type":"GENERATE"}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_event_frames() {
        assert_eq!(
            encode_event(&StreamEvent::token("Hel")).unwrap(),
            r#"{"type":"Token","payload":{"text":"Hel"}}"#
        );
        assert_eq!(
            encode_event(&StreamEvent::done(FinishReason::Stop)).unwrap(),
            r#"{"type":"Done","payload":{"finishReason":"stop"}}"#
        );
        assert_eq!(encode_event(&StreamEvent::Cancelled).unwrap(), r#"{"type":"Cancelled"}"#);

        let error = decode_event(
            r#"{"type":"Error","payload":{"kind":"RateLimited","message":"slow down","retryable":true}}"#,
        )
        .unwrap();
        assert_eq!(
            error,
            StreamEvent::Error {
                kind: ErrorKind::RateLimited,
                message: "slow down".into(),
                retryable: true,
            }
        );
    }
}
