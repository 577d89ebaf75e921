//! AI Client module
//!
//! Provider-agnostic client that drives one generation through the adapter
//! registered for its family:
//! - streaming calls relay deltas into an `EventSink`
//! - batch calls emit the whole answer as one token

pub mod config;
pub mod core;
pub mod simple;
pub mod streaming;

pub use config::{AiClientConfig, CallOptions};
pub use core::AiClient;
