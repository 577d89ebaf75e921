//! Session model
//!
//! A `Session` describes one request/response cycle: which model, what to
//! ask, the prior turns, and generation parameters. It is immutable once
//! dispatched.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ai::types::{ChatMessage, Role};

/// Per-session endpoint overrides for user-configured model modes
///
/// Empty strings mean "not set" and fall back to the user config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiMode {
    pub custom_url: String,
    pub api_key: String,
    pub custom_name: String,
}

impl ApiMode {
    pub fn url_override(&self) -> Option<&str> {
        non_empty(&self.custom_url)
    }

    pub fn key_override(&self) -> Option<&str> {
        non_empty(&self.api_key)
    }

    pub fn name_override(&self) -> Option<&str> {
        non_empty(&self.custom_name)
    }
}

/// Provider-agnostic generation parameters; unset values come from config
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationParams {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// One user request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default = "Uuid::new_v4")]
    pub session_id: Uuid,
    pub model_key: String,
    #[serde(default)]
    pub api_mode: Option<ApiMode>,
    pub prompt: String,
    /// Prior turns, oldest first
    #[serde(default)]
    pub conversation_context: Vec<ChatMessage>,
    #[serde(default)]
    pub generation_params: GenerationParams,
}

impl Session {
    pub fn new(model_key: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            model_key: model_key.into(),
            api_mode: None,
            prompt: prompt.into(),
            conversation_context: Vec::new(),
            generation_params: GenerationParams::default(),
        }
    }

    pub fn with_api_mode(mut self, api_mode: ApiMode) -> Self {
        self.api_mode = Some(api_mode);
        self
    }

    pub fn with_context(mut self, context: Vec<ChatMessage>) -> Self {
        self.conversation_context = context;
        self
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.generation_params = params;
        self
    }

    /// Messages sent to the provider
    ///
    /// System turns are always kept. Of the remaining history only the last
    /// `max_exchanges` user/assistant pairs survive; the prompt goes last.
    pub fn messages(&self, max_exchanges: usize) -> Vec<ChatMessage> {
        let system = self
            .conversation_context
            .iter()
            .filter(|m| m.role == Role::System);
        let history: Vec<&ChatMessage> = self
            .conversation_context
            .iter()
            .filter(|m| m.role != Role::System)
            .collect();
        let keep = max_exchanges.saturating_mul(2).min(history.len());
        let recent = history[history.len() - keep..].iter().copied();

        system
            .chain(recent)
            .cloned()
            .chain(std::iter::once(ChatMessage::user(self.prompt.clone())))
            .collect()
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
