//! Provider families and model classification
//!
//! Every model key maps to exactly one `ProviderFamily`. Keys outside the
//! registry fall back to the OpenAI chat family.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::models;
use crate::session::Session;

/// A class of backend APIs sharing one wire contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProviderFamily {
    ChatgptApi,
    GptCompletion,
    Claude,
    Moonshot,
    ChatGlm,
    DeepSeek,
    Ollama,
    OpenRouter,
    Aiml,
    Azure,
    Custom,
    GithubProxy,
}

impl ProviderFamily {
    /// All families in classification order
    ///
    /// Custom comes first since it is an explicit user override; the rest
    /// follow the fixed routing priority.
    pub fn all() -> &'static [ProviderFamily] {
        &[
            ProviderFamily::Custom,
            ProviderFamily::ChatgptApi,
            ProviderFamily::GptCompletion,
            ProviderFamily::Claude,
            ProviderFamily::Moonshot,
            ProviderFamily::ChatGlm,
            ProviderFamily::DeepSeek,
            ProviderFamily::Ollama,
            ProviderFamily::OpenRouter,
            ProviderFamily::Aiml,
            ProviderFamily::Azure,
            ProviderFamily::GithubProxy,
        ]
    }

    /// Short identifier used on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderFamily::ChatgptApi => "chatgpt",
            ProviderFamily::GptCompletion => "gpt-completion",
            ProviderFamily::Claude => "claude",
            ProviderFamily::Moonshot => "moonshot",
            ProviderFamily::ChatGlm => "chatglm",
            ProviderFamily::DeepSeek => "deepseek",
            ProviderFamily::Ollama => "ollama",
            ProviderFamily::OpenRouter => "openrouter",
            ProviderFamily::Aiml => "aiml",
            ProviderFamily::Azure => "azure",
            ProviderFamily::Custom => "custom",
            ProviderFamily::GithubProxy => "github",
        }
    }

    /// Parse the identifier produced by `as_str`
    pub fn from_name(name: &str) -> Option<ProviderFamily> {
        Self::all()
            .iter()
            .copied()
            .find(|family| family.as_str().eq_ignore_ascii_case(name))
    }

    /// Families whose model name is always user-supplied
    pub fn is_always_custom(&self) -> bool {
        matches!(
            self,
            ProviderFamily::Custom | ProviderFamily::Ollama | ProviderFamily::Azure
        )
    }
}

impl fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderFamily::ChatgptApi => write!(f, "ChatGPT (API)"),
            ProviderFamily::GptCompletion => write!(f, "GPT Completion (API)"),
            ProviderFamily::Claude => write!(f, "Claude.ai (API)"),
            ProviderFamily::Moonshot => write!(f, "Kimi.Moonshot (API)"),
            ProviderFamily::ChatGlm => write!(f, "ChatGLM (API)"),
            ProviderFamily::DeepSeek => write!(f, "DeepSeek (API)"),
            ProviderFamily::Ollama => write!(f, "Ollama (API)"),
            ProviderFamily::OpenRouter => write!(f, "OpenRouter (API)"),
            ProviderFamily::Aiml => write!(f, "AI/ML (API)"),
            ProviderFamily::Azure => write!(f, "ChatGPT (Azure API)"),
            ProviderFamily::Custom => write!(f, "Custom Model"),
            ProviderFamily::GithubProxy => write!(f, "Github Third Party Waylaidwanderer (API)"),
        }
    }
}

/// How to send the API key in requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AuthHeader {
    /// `Authorization: Bearer <key>` (OpenAI style), omitted when the key is empty
    #[default]
    Bearer,
    /// `x-api-key: <key>` (Anthropic style)
    XApiKey,
    /// `api-key: <key>` (Azure OpenAI)
    AzureApiKey,
    /// `Authorization: Bearer <jwt>` signed from an `id.secret` key (ChatGLM)
    GlmToken,
    /// No credential is sent
    None,
}

/// Classify a session's model key into its provider family
pub fn classify(session: &Session) -> ProviderFamily {
    classify_key(&session.model_key)
}

/// Classify a bare model key
///
/// Walks the families in priority order and returns the first whose key
/// group contains `model_key`; unknown keys route to the OpenAI chat API.
pub fn classify_key(model_key: &str) -> ProviderFamily {
    let key = model_key.trim();
    ProviderFamily::all()
        .iter()
        .copied()
        .find(|family| models::models_for(*family).any(|m| m.key == key))
        .unwrap_or(ProviderFamily::ChatgptApi)
}
