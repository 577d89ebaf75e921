//! Chatbridge Core - model routing and streaming dispatch for chat assistants
//!
//! This crate provides the pieces that sit between a chat UI and the
//! third-party LLM APIs it talks to:
//! - Model-key classification into provider families
//! - One adapter per provider family (OpenAI, Claude, ChatGLM, Ollama, ...)
//! - The dispatch router that resolves credentials and runs exactly one adapter
//! - A port-based bridge carrying stream events across an execution boundary
//! - The persisted user configuration

pub mod ai;
pub mod bridge;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod paths;
pub mod session;


// Re-exports for convenience
pub use ai::error::{ApiError, ErrorKind};
pub use ai::providers::{classify, ProviderFamily};
pub use ai::streaming::StreamEvent;
pub use ai::types::{ChatMessage, FinishReason, Role};
pub use bridge::{Bridge, ContentPort};
pub use config::{ConfigStore, UserConfig};
pub use dispatch::Dispatcher;
pub use session::{ApiMode, GenerationParams, Session};
