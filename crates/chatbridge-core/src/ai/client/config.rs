//! AI Client configuration
//!
//! Everything a client needs for one call, already resolved from the
//! session and user config by the dispatcher.

use crate::ai::providers::ProviderFamily;
use crate::constants;

/// Configuration for the AI client
#[derive(Debug, Clone, PartialEq)]
pub struct AiClientConfig {
    /// Which family's adapter handles the call
    pub family: ProviderFamily,
    /// Model ID (or Azure deployment) to use for API calls
    pub model: String,
    /// Endpoint base (or the full URL for custom and proxy endpoints)
    pub base_url: String,
    /// Ollama `keep_alive` duration
    pub keep_alive: Option<String>,
    /// Stream the answer token by token, else fetch it in one response
    pub streaming: bool,
}

impl AiClientConfig {
    pub fn new(family: ProviderFamily, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            family,
            model: model.into(),
            base_url: base_url.into(),
            keep_alive: None,
            streaming: true,
        }
    }

    /// Base URL without trailing slashes
    pub fn trimmed_base(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }
}

/// Per-call generation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallOptions {
    /// Maximum output tokens
    pub max_tokens: u32,
    pub temperature: f32,
    /// Whether the request asks the provider to stream
    pub stream: bool,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            max_tokens: constants::ai::MAX_RESPONSE_TOKENS,
            temperature: constants::ai::TEMPERATURE,
            stream: true,
        }
    }
}
