//! UI-side end of a bridge connection

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::protocol::{ProtocolError, Request};
use crate::ai::streaming::StreamEvent;
use crate::session::Session;

/// Identifier of one port (one tab or one stdio client)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(Uuid);

impl PortId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "port-{}", self.0)
    }
}

/// Long-lived connection from the UI to the dispatch side
///
/// Dropping the port is a disconnect: any live stream is aborted.
pub struct ContentPort {
    id: PortId,
    requests: mpsc::UnboundedSender<Request>,
    events: mpsc::UnboundedReceiver<StreamEvent>,
}

impl ContentPort {
    pub(crate) fn new(
        id: PortId,
        requests: mpsc::UnboundedSender<Request>,
        events: mpsc::UnboundedReceiver<StreamEvent>,
    ) -> Self {
        Self {
            id,
            requests,
            events,
        }
    }

    pub fn id(&self) -> PortId {
        self.id
    }

    pub fn post(&self, request: Request) -> Result<(), ProtocolError> {
        self.requests
            .send(request)
            .map_err(|_| ProtocolError::Disconnected)
    }

    /// Start generating an answer for `session`
    pub fn post_session(&self, session: Session) -> Result<(), ProtocolError> {
        self.post(Request::Generate { session })
    }

    /// Ask the dispatch side to cancel the live stream
    pub fn stop(&self) -> Result<(), ProtocolError> {
        self.post(Request::Stop)
    }

    /// Next event, or `None` once the dispatch side is gone
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    /// Disconnect
    pub fn close(self) {}
}
