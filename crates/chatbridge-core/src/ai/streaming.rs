//! Normalized stream events and the sink adapters write them through
//!
//! Every generation yields zero or more `Token` events followed by exactly
//! one terminal event. `EventSink` owns that rule: once a terminal event has
//! been sent, everything else is dropped.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::error::{ApiError, ErrorKind};
use super::types::FinishReason;

/// Unit of output delivered to the UI side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum StreamEvent {
    Token {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Done {
        finish_reason: FinishReason,
    },
    Error {
        kind: ErrorKind,
        message: String,
        retryable: bool,
    },
    Cancelled,
}

impl StreamEvent {
    pub fn token(text: impl Into<String>) -> Self {
        StreamEvent::Token { text: text.into() }
    }

    pub fn done(finish_reason: FinishReason) -> Self {
        StreamEvent::Done { finish_reason }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Token { .. })
    }
}

impl From<ApiError> for StreamEvent {
    fn from(err: ApiError) -> Self {
        StreamEvent::Error {
            retryable: err.retryable(),
            kind: err.kind,
            message: err.message,
        }
    }
}

/// Write side of one generation stream
///
/// Checks the cancellation token before every token, so output already
/// buffered by the transport is discarded once the UI asks to stop. If the
/// receiver goes away the token is cancelled, which aborts the request.
pub struct EventSink {
    tx: mpsc::UnboundedSender<StreamEvent>,
    cancel: CancellationToken,
    tokens: usize,
    terminated: bool,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<StreamEvent>, cancel: CancellationToken) -> Self {
        Self {
            tx,
            cancel,
            tokens: 0,
            terminated: false,
        }
    }

    /// Create a sink together with the receiving end
    pub fn channel(cancel: CancellationToken) -> (Self, mpsc::UnboundedReceiver<StreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx, cancel), rx)
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Number of tokens delivered so far
    pub fn tokens_sent(&self) -> usize {
        self.tokens
    }

    /// Emit a text delta
    ///
    /// Returns false when the stream should stop: it was cancelled, already
    /// terminated, or nobody is listening anymore.
    pub fn token(&mut self, text: impl Into<String>) -> bool {
        if self.terminated {
            return false;
        }
        if self.cancel.is_cancelled() {
            self.cancelled();
            return false;
        }
        let text = text.into();
        if text.is_empty() {
            return true;
        }
        if self.tx.send(StreamEvent::Token { text }).is_err() {
            debug!("Stream receiver dropped, cancelling request");
            self.terminated = true;
            self.cancel.cancel();
            return false;
        }
        self.tokens += 1;
        true
    }

    /// Terminate with `Done`, or `Cancelled` if a cancel was observed
    pub fn finish(&mut self, reason: FinishReason) {
        if self.cancel.is_cancelled() {
            self.cancelled();
        } else {
            self.terminate(StreamEvent::done(reason));
        }
    }

    /// Terminate with `Error`, or `Cancelled` if a cancel was observed
    pub fn fail(&mut self, err: ApiError) {
        if self.cancel.is_cancelled() {
            self.cancelled();
        } else {
            self.terminate(err.into());
        }
    }

    /// Terminate with `Cancelled`
    pub fn cancelled(&mut self) {
        self.terminate(StreamEvent::Cancelled);
    }

    fn terminate(&mut self, event: StreamEvent) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        debug!(tokens = self.tokens, "Stream terminated: {:?}", event);
        let _ = self.tx.send(event);
    }
}

impl Drop for EventSink {
    fn drop(&mut self) {
        if self.terminated {
            return;
        }
        if self.cancel.is_cancelled() {
            self.cancelled();
        } else {
            self.terminate(
                ApiError::new(ErrorKind::ProtocolError, "stream ended without a terminal event")
                    .into(),
            );
        }
    }
}
