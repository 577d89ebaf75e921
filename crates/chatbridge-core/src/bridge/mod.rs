//! Streaming transport bridge
//!
//! Carries sessions from the UI side to the dispatch side and stream
//! events back, one logical stream per port.
//!
//! ```text
//! ┌─────────────────┐   GENERATE / STOP    ┌─────────────────┐
//! │   ContentPort   │─────────────────────►│     Bridge      │
//! │    (UI side)    │                      │  port task      │
//! │                 │◄─────────────────────│  Dispatcher     │
//! └─────────────────┘  Token* + terminal   └─────────────────┘
//! ```
//!
//! Over a process boundary the same frames travel as NDJSON (`serve_io`).

mod port;
mod protocol;
mod server;

pub use port::{ContentPort, PortId};
pub use protocol::{decode_event, decode_request, encode_event, ProtocolError, Request};
pub use server::Bridge;
