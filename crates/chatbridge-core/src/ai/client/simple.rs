//! Simple (non-streaming) API calls
//!
//! Used when the user turns streaming off: one request, one response, and
//! the whole answer delivered as a single token.

use serde_json::Value;
use tracing::{debug, info};

use super::config::CallOptions;
use super::core::{until_cancelled, AiClient};
use crate::ai::error::ApiError;
use crate::ai::streaming::EventSink;
use crate::ai::types::{ChatMessage, FinishReason};

impl AiClient {
    /// Make a simple non-streaming API call and return the answer text
    pub async fn call_simple(
        &self,
        messages: &[ChatMessage],
        options: &CallOptions,
    ) -> Result<String, ApiError> {
        let adapter = self.adapter();
        let options = CallOptions {
            stream: false,
            ..*options
        };
        let url = adapter.endpoint(self.config())?;
        let body = adapter.build_body(self.config(), messages, &options);

        info!(
            "Batch API call: family: {}, model: {}",
            self.config().family,
            self.config().model
        );
        let response = self.build_request(&url)?.json(&body).send().await?;
        let response = self.handle_error_response(response).await?;

        let json: Value = response.json().await?;
        let text = adapter.parse_batch(&json)?;
        debug!("Batch response: {} chars", text.len());
        Ok(text)
    }

    /// Batch call delivered through the sink as one `Token` then `Done`
    pub(crate) async fn call_simple_into(
        &self,
        messages: &[ChatMessage],
        options: &CallOptions,
        sink: &mut EventSink,
    ) {
        let cancel = sink.cancel_token().clone();
        match until_cancelled(&cancel, self.call_simple(messages, options)).await {
            None => sink.cancelled(),
            Some(Ok(text)) => {
                if sink.token(text) {
                    sink.finish(FinishReason::Stop);
                }
            }
            Some(Err(e)) => sink.fail(e),
        }
    }
}
