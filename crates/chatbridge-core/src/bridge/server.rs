//! Dispatch-side end of the bridge
//!
//! Each connected port gets one task that owns at most one live stream.
//! The registry of live streams is shared so the host can observe and
//! cancel them.

use anyhow::Result;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::port::{ContentPort, PortId};
use super::protocol::{decode_request, encode_event, Request};
use crate::ai::streaming::StreamEvent;
use crate::config::ConfigStore;
use crate::dispatch::Dispatcher;

/// The stream currently running on a port
struct LiveStream {
    session_id: Uuid,
    cancel: CancellationToken,
    events: mpsc::UnboundedReceiver<StreamEvent>,
    /// STOP was received; queued tokens are discarded
    stopping: bool,
}

impl LiveStream {
    fn stop(&mut self) {
        self.stopping = true;
        self.cancel.cancel();
    }

    /// What the port sees for an event pulled off this stream
    ///
    /// Once stopping, queued tokens are dropped and a queued `Done` is
    /// reported as `Cancelled`.
    fn outgoing(&self, event: StreamEvent) -> Option<StreamEvent> {
        if !self.stopping {
            return Some(event);
        }
        match event {
            StreamEvent::Token { .. } => None,
            StreamEvent::Done { .. } => Some(StreamEvent::Cancelled),
            other => Some(other),
        }
    }
}

/// Hosts ports and routes their sessions through the dispatcher
#[derive(Clone)]
pub struct Bridge {
    dispatcher: Dispatcher,
    config: Arc<ConfigStore>,
    /// Session currently streaming on each port
    streams: Arc<DashMap<PortId, Uuid>>,
    shutdown: CancellationToken,
}

impl Bridge {
    pub fn new(dispatcher: Dispatcher, config: Arc<ConfigStore>) -> Self {
        Self {
            dispatcher,
            config,
            streams: Arc::new(DashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Open a new port served by its own task
    pub fn connect(&self) -> ContentPort {
        let id = PortId::new();
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let bridge = self.clone();
        tokio::spawn(async move {
            bridge.serve_port(id, request_rx, event_tx).await;
        });
        debug!("Connected {}", id);
        ContentPort::new(id, request_tx, event_rx)
    }

    /// Number of ports with a stream in flight
    pub fn active_streams(&self) -> usize {
        self.streams.len()
    }

    /// Session streaming on a port, if any
    pub fn live_session(&self, port: PortId) -> Option<Uuid> {
        self.streams.get(&port).map(|entry| *entry.value())
    }

    /// Cancel every live stream; later sessions end as `Cancelled` at once
    pub fn shutdown(&self) {
        for entry in self.streams.iter() {
            debug!("Cancelling {} on {}", entry.value(), entry.key());
        }
        info!("Bridge shutdown: cancelling {} streams", self.streams.len());
        self.shutdown.cancel();
    }

    async fn serve_port(
        &self,
        id: PortId,
        mut requests: mpsc::UnboundedReceiver<Request>,
        events: mpsc::UnboundedSender<StreamEvent>,
    ) {
        let mut live: Option<LiveStream> = None;

        loop {
            tokio::select! {
                request = requests.recv() => match request {
                    Some(Request::Generate { session }) => {
                        if let Some(mut old) = live.take() {
                            info!("New session on {} replaces {}", id, old.session_id);
                            old.stop();
                            if !drain(&mut old, &events).await {
                                break;
                            }
                        }
                        let cancel = self.shutdown.child_token();
                        let session_id = session.session_id;
                        self.streams.insert(id, session_id);
                        let rx = self
                            .dispatcher
                            .dispatch(session, self.config.snapshot(), cancel.clone());
                        live = Some(LiveStream {
                            session_id,
                            cancel,
                            events: rx,
                            stopping: false,
                        });
                    }
                    Some(Request::Stop) => match live.as_mut() {
                        Some(stream) => {
                            debug!("STOP on {} for {}", id, stream.session_id);
                            stream.stop();
                        }
                        None => debug!("STOP on {} with no live stream", id),
                    },
                    None => {
                        info!("{} disconnected", id);
                        if let Some(mut stream) = live.take() {
                            stream.stop();
                        }
                        break;
                    }
                },
                event = next_event(&mut live) => {
                    let Some(stream) = live.as_mut() else { continue };
                    match event.map(|event| stream.outgoing(event)) {
                        Some(None) => {}
                        Some(Some(event)) => {
                            let terminal = event.is_terminal();
                            if events.send(event).is_err() {
                                stream.stop();
                                break;
                            }
                            if terminal {
                                debug!("Stream {} on {} finished", stream.session_id, id);
                                live = None;
                                self.streams.remove(&id);
                            }
                        }
                        None => {
                            live = None;
                            self.streams.remove(&id);
                        }
                    }
                }
            }
        }

        if let Some(mut stream) = live.take() {
            stream.stop();
        }
        self.streams.remove(&id);
    }

    /// Host one port over NDJSON frames, e.g. stdin/stdout
    ///
    /// EOF on the reader is a half-close: streams already requested run to
    /// their terminal event before this returns. Unsupported or malformed
    /// frames are logged and skipped.
    pub async fn serve_io<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut port = self.connect();
        let mut lines = reader.lines();
        let mut input_open = true;
        // GENERATE frames still owed a terminal event
        let mut pending = 0usize;
        info!("Serving {} over stdio", port.id());

        loop {
            tokio::select! {
                line = lines.next_line(), if input_open => {
                    let Some(line) = line? else {
                        debug!("Input closed with {} streams pending", pending);
                        input_open = false;
                        if pending == 0 {
                            break;
                        }
                        continue;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match decode_request(&line) {
                        Ok(request) => {
                            if matches!(request, Request::Generate { .. }) {
                                pending += 1;
                            }
                            port.post(request)?;
                        }
                        Err(e) => warn!("Ignoring frame: {}", e),
                    }
                }
                event = port.next_event() => {
                    let Some(event) = event else { break };
                    let terminal = event.is_terminal();
                    let mut frame = encode_event(&event)?;
                    frame.push('\n');
                    writer.write_all(frame.as_bytes()).await?;
                    writer.flush().await?;
                    if terminal {
                        pending = pending.saturating_sub(1);
                        if !input_open && pending == 0 {
                            break;
                        }
                    }
                }
            }
        }

        port.close();
        Ok(())
    }
}

/// Next event of the live stream; pending while there is none
async fn next_event(live: &mut Option<LiveStream>) -> Option<StreamEvent> {
    match live {
        Some(stream) => stream.events.recv().await,
        None => std::future::pending().await,
    }
}

/// Forward the rest of a stopped stream up to its terminal event
///
/// Returns false if the port's receiver is gone.
async fn drain(stream: &mut LiveStream, events: &mpsc::UnboundedSender<StreamEvent>) -> bool {
    while let Some(event) = stream.events.recv().await {
        if let Some(event) = stream.outgoing(event) {
            return events.send(event).is_ok();
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::decode_event;
    use crate::ai::error::ErrorKind;
    use crate::ai::types::FinishReason;
    use crate::config::UserConfig;
    use crate::session::Session;

    fn bridge_with(config: UserConfig) -> Bridge {
        Bridge::new(Dispatcher::new(), Arc::new(ConfigStore::in_memory(config)))
    }

    /// A stream whose dispatch side already queued `events` and hung up
    fn queued(events: Vec<StreamEvent>) -> LiveStream {
        let (tx, rx) = mpsc::unbounded_channel();
        for event in events {
            tx.send(event).unwrap();
        }
        LiveStream {
            session_id: Uuid::new_v4(),
            cancel: CancellationToken::new(),
            events: rx,
            stopping: false,
        }
    }

    #[tokio::test]
    async fn test_stop_turns_queued_done_into_cancelled() {
        let mut stream = queued(vec![
            StreamEvent::token("a"),
            StreamEvent::token("b"),
            StreamEvent::done(FinishReason::Stop),
        ]);
        stream.stop();
        assert!(stream.cancel.is_cancelled());

        let mut seen = Vec::new();
        while let Some(event) = stream.events.recv().await {
            seen.extend(stream.outgoing(event));
        }
        assert_eq!(seen, vec![StreamEvent::Cancelled]);
    }

    #[tokio::test]
    async fn test_drain_reports_cancelled_over_done() {
        let mut stream = queued(vec![
            StreamEvent::token("late"),
            StreamEvent::done(FinishReason::Stop),
        ]);
        stream.stop();
        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(drain(&mut stream, &tx).await);
        assert_eq!(rx.recv().await, Some(StreamEvent::Cancelled));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_running_stream_forwards_everything() {
        let stream = queued(Vec::new());
        assert_eq!(stream.outgoing(StreamEvent::token("a")), Some(StreamEvent::token("a")));
        assert_eq!(
            stream.outgoing(StreamEvent::done(FinishReason::Length)),
            Some(StreamEvent::done(FinishReason::Length))
        );
    }

    #[tokio::test]
    async fn test_preflight_error_reaches_port() {
        let bridge = bridge_with(UserConfig {
            custom_model_api_url: String::new(),
            ..UserConfig::default()
        });
        let mut port = bridge.connect();
        port.post_session(Session::new("customModel", "hi")).unwrap();

        match port.next_event().await.unwrap() {
            StreamEvent::Error { kind, retryable, .. } => {
                assert_eq!(kind, ErrorKind::ConfigError);
                assert!(!retryable);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_shutdown_cancels_new_sessions() {
        let bridge = bridge_with(UserConfig::default());
        bridge.shutdown();
        let mut port = bridge.connect();
        // would otherwise hit the network
        port.post_session(Session::new("ollamaModel", "hi")).unwrap();
        assert_eq!(port.next_event().await.unwrap(), StreamEvent::Cancelled);
    }

    #[tokio::test]
    async fn test_stop_without_stream_is_ignored() {
        let bridge = bridge_with(UserConfig {
            api_key: String::new(),
            ..UserConfig::default()
        });
        let mut port = bridge.connect();
        port.stop().unwrap();
        port.post_session(Session::new("chatgptApi5", "hi")).unwrap();
        assert!(matches!(
            port.next_event().await.unwrap(),
            StreamEvent::Error { kind: ErrorKind::AuthError, .. }
        ));
        assert_eq!(bridge.active_streams(), 0);
    }

    #[tokio::test]
    async fn test_serve_io_skips_legacy_frames() {
        let bridge = bridge_with(UserConfig::default());
        let input = concat!(
            r#"{"type":"FEEDBACK","data":{}}"#,
            "\n",
            r#"{"type":"GENERATE","session":{"modelKey":"claude37SonnetApi","prompt":"hi"}}"#,
            "\n",
        );
        let (client, server) = tokio::io::duplex(4096);
        let (server_read, server_write) = tokio::io::split(server);
        let (client_read, mut client_write) = tokio::io::split(client);

        let host = tokio::spawn(async move {
            bridge
                .serve_io(tokio::io::BufReader::new(server_read), server_write)
                .await
        });
        client_write.write_all(input.as_bytes()).await.unwrap();

        let mut lines = tokio::io::BufReader::new(client_read).lines();
        let frame = lines.next_line().await.unwrap().unwrap();
        assert!(frame.starts_with(r#"{"type":"Error","payload":{"kind":"AuthError""#));
        assert!(matches!(
            decode_event(&frame).unwrap(),
            StreamEvent::Error { retryable: false, .. }
        ));

        drop(lines);
        drop(client_write);
        host.await.unwrap().unwrap();
    }
}
