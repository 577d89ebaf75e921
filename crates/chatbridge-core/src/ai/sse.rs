//! SSE (Server-Sent Events) stream processing utilities
//!
//! Handles line framing of streamed provider responses. Bytes are buffered
//! until a full line is available, so a chunk boundary may fall anywhere,
//! including inside a multi-byte character.

use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info};

use super::error::ApiError;
use super::types::FinishReason;

/// How a streamed body is framed on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// `data: <json>` lines, terminated by `data: [DONE]` or end of body
    Sse,
    /// One JSON document per line (Ollama)
    Ndjson,
}

/// Events that can be parsed from stream data
#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    TextDelta(String),
    Finish { reason: FinishReason },
    Skip,
}

/// Trait for provider-specific stream parsing logic
///
/// Parsers may keep state between events (Claude reports the stop reason
/// before its final `message_stop`).
pub trait SseParser: Send {
    /// Parse a JSON event into a stream event
    fn parse_event(&mut self, json: &Value) -> Result<SseEvent, ApiError>;

    /// Finish reason seen so far, used when the stream ends on `[DONE]`
    fn finish_reason(&self) -> Option<FinishReason> {
        None
    }
}

/// Common stream processor that handles partial lines and buffering
pub struct SseStreamProcessor {
    framing: Framing,
    /// Bytes of a line not yet terminated by `\n`
    partial: Vec<u8>,
    stream_start: Instant,
    event_count: usize,
    bytes_received: usize,
    finished: bool,
}

impl SseStreamProcessor {
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            partial: Vec::new(),
            stream_start: Instant::now(),
            event_count: 0,
            bytes_received: 0,
            finished: false,
        }
    }

    /// Process a chunk of bytes, returning the events it completed
    pub fn process_chunk(
        &mut self,
        bytes: &[u8],
        parser: &mut dyn SseParser,
    ) -> Result<Vec<SseEvent>, ApiError> {
        self.bytes_received += bytes.len();
        debug!(
            "Stream chunk received: {} bytes (total: {} bytes)",
            bytes.len(),
            self.bytes_received
        );

        let mut events = Vec::new();
        if self.finished {
            return Ok(events);
        }
        self.partial.extend_from_slice(bytes);

        while let Some(pos) = self.partial.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            self.process_line(&line, parser, &mut events)?;
            if self.finished {
                self.partial.clear();
                break;
            }
        }

        Ok(events)
    }

    /// Flush a trailing unterminated line once the body has ended
    pub fn finish(&mut self, parser: &mut dyn SseParser) -> Result<Vec<SseEvent>, ApiError> {
        let mut events = Vec::new();
        if !self.finished && !self.partial.is_empty() {
            let line = std::mem::take(&mut self.partial);
            self.process_line(&line, parser, &mut events)?;
        }
        info!(
            "Stream processor finishing: {:?} elapsed, {} events, {} bytes total",
            self.stream_start.elapsed(),
            self.event_count,
            self.bytes_received
        );
        Ok(events)
    }

    fn process_line(
        &mut self,
        raw: &[u8],
        parser: &mut dyn SseParser,
        events: &mut Vec<SseEvent>,
    ) -> Result<(), ApiError> {
        let line = std::str::from_utf8(raw)
            .map_err(|e| ApiError::protocol(format!("stream is not valid UTF-8: {}", e)))?;
        let line = line.trim_end_matches(['\n', '\r']);

        match self.framing {
            Framing::Sse => {
                // Blank lines, comments and other SSE fields carry no text
                if line.is_empty() || line.starts_with(':') {
                    return Ok(());
                }
                if let Some(data) = line.strip_prefix("data:") {
                    let data = data.strip_prefix(' ').unwrap_or(data);
                    self.process_data(data, parser, events)?;
                }
            }
            Framing::Ndjson => {
                if !line.trim().is_empty() {
                    self.process_data(line, parser, events)?;
                }
            }
        }
        Ok(())
    }

    /// Process one data payload using the provider-specific parser
    fn process_data(
        &mut self,
        data: &str,
        parser: &mut dyn SseParser,
        events: &mut Vec<SseEvent>,
    ) -> Result<(), ApiError> {
        if data.trim().is_empty() {
            return Ok(());
        }
        self.event_count += 1;
        let elapsed = self.stream_start.elapsed();

        if data.trim() == "[DONE]" {
            info!(
                "Stream [DONE] marker received after {:?}, {} events, {} bytes",
                elapsed, self.event_count, self.bytes_received
            );
            self.finished = true;
            events.push(SseEvent::Finish {
                reason: parser.finish_reason().unwrap_or(FinishReason::Stop),
            });
            return Ok(());
        }

        let json: Value = serde_json::from_str(data).map_err(|e| {
            ApiError::protocol(format!(
                "invalid stream payload (event #{}): {}",
                self.event_count, e
            ))
        })?;

        match parser.parse_event(&json)? {
            SseEvent::TextDelta(text) => {
                debug!("  -> TextDelta: {} chars", text.len());
                events.push(SseEvent::TextDelta(text));
            }
            SseEvent::Finish { reason } => {
                info!(
                    "Stream finish: reason={} at {:?} ({} events, {} bytes)",
                    reason, elapsed, self.event_count, self.bytes_received
                );
                self.finished = true;
                events.push(SseEvent::Finish { reason });
            }
            SseEvent::Skip => debug!("  -> Skip event"),
        }
        Ok(())
    }
}

/// Common helper to parse finish reasons
pub fn parse_finish_reason(reason_str: &str) -> FinishReason {
    match reason_str {
        "stop" | "end_turn" | "stop_sequence" | "eos" => FinishReason::Stop,
        "length" | "max_tokens" => FinishReason::Length,
        _ => FinishReason::Other(reason_str.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Emits `text` fields, finishes on `end`
    struct EchoParser;

    impl SseParser for EchoParser {
        fn parse_event(&mut self, json: &Value) -> Result<SseEvent, ApiError> {
            if json.get("end").is_some() {
                return Ok(SseEvent::Finish {
                    reason: FinishReason::Length,
                });
            }
            Ok(json
                .get("text")
                .and_then(|t| t.as_str())
                .map(|t| SseEvent::TextDelta(t.to_string()))
                .unwrap_or(SseEvent::Skip))
        }
    }

    fn texts(events: &[SseEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                SseEvent::TextDelta(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    fn run(framing: Framing, chunks: &[&[u8]]) -> Vec<SseEvent> {
        let mut processor = SseStreamProcessor::new(framing);
        let mut parser = EchoParser;
        let mut events = Vec::new();
        for chunk in chunks {
            events.extend(processor.process_chunk(chunk, &mut parser).unwrap());
        }
        events.extend(processor.finish(&mut parser).unwrap());
        events
    }

    const PAYLOAD: &str = concat!(
        ": keep-alive\n\n",
        "event: delta\n",
        "data: {\"text\":\"Hé\"}\r\n\r\n",
        "data:{\"text\":\"llo 🌍\"}\n\n",
        "data: {\"other\":1}\n\n",
        "data: {\"text\":\"!\"}\n\n",
        "data: [DONE]\n\n",
    );

    #[test]
    fn test_sse_whole_payload() {
        let events = run(Framing::Sse, &[PAYLOAD.as_bytes()]);
        assert_eq!(texts(&events), vec!["Hé", "llo 🌍", "!"]);
        assert_eq!(
            events.last(),
            Some(&SseEvent::Finish {
                reason: FinishReason::Stop
            })
        );
    }

    #[test]
    fn test_split_at_every_byte_offset() {
        let bytes = PAYLOAD.as_bytes();
        let expected = texts(&run(Framing::Sse, &[bytes]));
        for split in 0..=bytes.len() {
            let (a, b) = bytes.split_at(split);
            assert_eq!(texts(&run(Framing::Sse, &[a, b])), expected, "split at {}", split);
        }
        let singles: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(texts(&run(Framing::Sse, &singles)), expected);
    }

    #[test]
    fn test_invalid_json_is_protocol_error() {
        let mut processor = SseStreamProcessor::new(Framing::Sse);
        let err = processor
            .process_chunk(b"data: {not json}\n\n", &mut EchoParser)
            .unwrap_err();
        assert_eq!(err.kind, crate::ai::error::ErrorKind::ProtocolError);
    }

    #[test]
    fn test_input_after_finish_is_ignored() {
        let events = run(
            Framing::Sse,
            &[b"data: {\"text\":\"a\"}\n\ndata: {\"end\":true}\n\ndata: {\"text\":\"b\"}\n\n"],
        );
        assert_eq!(texts(&events), vec!["a"]);
        assert_eq!(
            events.last(),
            Some(&SseEvent::Finish {
                reason: FinishReason::Length
            })
        );
    }

    #[test]
    fn test_ndjson_with_unterminated_last_line() {
        let events = run(
            Framing::Ndjson,
            &[b"{\"text\":\"x\"}\n\n{\"te", b"xt\":\"y\"}"],
        );
        assert_eq!(texts(&events), vec!["x", "y"]);
    }

    #[test]
    fn test_parse_finish_reason() {
        assert_eq!(parse_finish_reason("stop"), FinishReason::Stop);
        assert_eq!(parse_finish_reason("end_turn"), FinishReason::Stop);
        assert_eq!(parse_finish_reason("max_tokens"), FinishReason::Length);
        assert_eq!(parse_finish_reason("length"), FinishReason::Length);
        assert_eq!(
            parse_finish_reason("content_filter"),
            FinishReason::Other("content_filter".to_string())
        );
    }
}
