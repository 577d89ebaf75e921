//! Streaming API calls
//!
//! Sends the request, then relays parsed deltas into the sink until the
//! provider finishes, fails, or the sink's cancellation token fires.
//! Returning drops the response, which closes the connection.

use futures::StreamExt;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::config::CallOptions;
use super::core::{until_cancelled, AiClient};
use crate::ai::error::ApiError;
use crate::ai::sse::{SseEvent, SseStreamProcessor};
use crate::ai::streaming::EventSink;
use crate::ai::types::{ChatMessage, FinishReason};

impl AiClient {
    /// Call the API with a streaming response
    pub async fn call_streaming(
        &self,
        messages: &[ChatMessage],
        options: &CallOptions,
        sink: &mut EventSink,
    ) {
        let call_start = Instant::now();
        info!(
            "=== API CALL START === family: {}, model: {}, messages: {}",
            self.config().family,
            self.config().model,
            messages.len()
        );

        match self.stream_into(messages, options, sink).await {
            Ok(Some(reason)) => {
                info!(
                    "Stream complete in {:?}: {} tokens, reason={}",
                    call_start.elapsed(),
                    sink.tokens_sent(),
                    reason
                );
                sink.finish(reason);
            }
            Ok(None) => {
                info!(
                    "Stream cancelled after {:?} ({} tokens delivered)",
                    call_start.elapsed(),
                    sink.tokens_sent()
                );
                sink.cancelled();
            }
            Err(e) => {
                warn!("Stream failed after {:?}: {}", call_start.elapsed(), e);
                sink.fail(e);
            }
        }
    }

    /// Relay the stream; `Ok(None)` means it was stopped early
    async fn stream_into(
        &self,
        messages: &[ChatMessage],
        options: &CallOptions,
        sink: &mut EventSink,
    ) -> Result<Option<FinishReason>, ApiError> {
        let adapter = self.adapter();
        let options = CallOptions {
            stream: true,
            ..*options
        };
        let url = adapter.endpoint(self.config())?;
        let body = adapter.build_body(self.config(), messages, &options);
        let request = self.build_request(&url)?.json(&body);
        let cancel = sink.cancel_token().clone();

        info!("Sending API request...");
        let request_start = Instant::now();
        let Some(response) = until_cancelled(&cancel, request.send()).await else {
            return Ok(None);
        };
        let response = response?;
        info!(
            "API response: {} in {:?}",
            response.status(),
            request_start.elapsed()
        );
        let Some(response) = until_cancelled(&cancel, self.handle_error_response(response)).await
        else {
            return Ok(None);
        };
        let response = response?;

        let mut parser = adapter.parser();
        let mut processor = SseStreamProcessor::new(adapter.framing());
        let mut stream = response.bytes_stream();

        loop {
            let Some(chunk) = until_cancelled(&cancel, stream.next()).await else {
                debug!("Cancellation observed between chunks");
                return Ok(None);
            };
            let Some(chunk) = chunk else {
                break;
            };
            let events = processor.process_chunk(&chunk?, parser.as_mut())?;
            if let Some(outcome) = relay(events, sink) {
                return Ok(outcome);
            }
        }

        let events = processor.finish(parser.as_mut())?;
        if let Some(outcome) = relay(events, sink) {
            return Ok(outcome);
        }

        // Body ended without an explicit finish marker
        Ok(Some(parser.finish_reason().unwrap_or(FinishReason::Stop)))
    }
}

/// Forward parsed events; `Some` once the stream should end
fn relay(events: Vec<SseEvent>, sink: &mut EventSink) -> Option<Option<FinishReason>> {
    for event in events {
        match event {
            SseEvent::TextDelta(text) => {
                if !sink.token(text) {
                    return Some(None);
                }
            }
            SseEvent::Finish { reason } => return Some(Some(reason)),
            SseEvent::Skip => {}
        }
    }
    None
}
