//! AI provider layer
//!
//! Handles communication with chat providers (OpenAI, Claude, ChatGLM, Ollama, etc.)
//! Every provider family is served by one adapter; all of them normalize into
//! the same `StreamEvent` sequence.

// Modular architecture
pub mod adapters;
pub mod client;
pub mod format;
pub mod retry;

// Provider-specific configuration
pub mod glm;
pub mod models;
pub mod providers;

// Shared infrastructure
pub mod error;
pub mod parsers;
pub mod sse;
pub mod streaming;
pub mod types;

pub use client::{AiClient, AiClientConfig, CallOptions};
