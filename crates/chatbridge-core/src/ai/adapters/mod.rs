//! Provider adapters
//!
//! One adapter per provider family. An adapter knows where to send a
//! request, how to authenticate it, how to shape its body and how to read
//! the answer back, streamed or not. The transport itself lives in
//! `AiClient`, so adapters are plain data-shaping objects.

mod azure;
mod chatglm;
mod claude;
mod completion;
mod github;
mod ollama;
mod openai_compat;

pub use azure::AzureAdapter;
pub use chatglm::ChatGlmAdapter;
pub use claude::ClaudeAdapter;
pub use completion::CompletionAdapter;
pub use github::GithubProxyAdapter;
pub use ollama::OllamaAdapter;
pub use openai_compat::ChatCompletionsAdapter;

use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

use super::client::config::{AiClientConfig, CallOptions};
use super::error::ApiError;
use super::providers::{AuthHeader, ProviderFamily};
use super::sse::{Framing, SseParser};
use super::types::ChatMessage;
use crate::constants::endpoints;

/// Request/response shaping for one provider family
pub trait ProviderAdapter: Send + Sync {
    fn family(&self) -> ProviderFamily;

    /// How the API key is sent
    fn auth_header(&self) -> AuthHeader {
        AuthHeader::Bearer
    }

    /// Whether dispatch must refuse to call without an API key
    fn requires_api_key(&self) -> bool {
        true
    }

    /// Static headers sent with every request
    fn extra_headers(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Line framing of the streamed body
    fn framing(&self) -> Framing {
        Framing::Sse
    }

    /// Full request URL
    fn endpoint(&self, config: &AiClientConfig) -> Result<String, ApiError>;

    /// Request body; `options.stream` selects streamed delivery
    fn build_body(
        &self,
        config: &AiClientConfig,
        messages: &[ChatMessage],
        options: &CallOptions,
    ) -> Value;

    /// Fresh parser for one streamed response
    fn parser(&self) -> Box<dyn SseParser>;

    /// Answer text of a complete, non-streamed response
    fn parse_batch(&self, response: &Value) -> Result<String, ApiError>;
}

static ADAPTERS: LazyLock<HashMap<ProviderFamily, Box<dyn ProviderAdapter>>> =
    LazyLock::new(|| {
        let adapters: Vec<Box<dyn ProviderAdapter>> = vec![
            Box::new(ChatCompletionsAdapter::chatgpt()),
            Box::new(CompletionAdapter),
            Box::new(ClaudeAdapter),
            Box::new(ChatCompletionsAdapter::compatible(
                ProviderFamily::Moonshot,
                Some((0.0, 1.0)),
            )),
            Box::new(ChatGlmAdapter),
            Box::new(ChatCompletionsAdapter::compatible(ProviderFamily::DeepSeek, None)),
            Box::new(OllamaAdapter),
            Box::new(ChatCompletionsAdapter::compatible(ProviderFamily::OpenRouter, None)),
            Box::new(ChatCompletionsAdapter::compatible(ProviderFamily::Aiml, None)),
            Box::new(AzureAdapter),
            Box::new(ChatCompletionsAdapter::custom()),
            Box::new(GithubProxyAdapter),
        ];
        adapters.into_iter().map(|a| (a.family(), a)).collect()
    });

/// Look up the adapter registered for a family
pub fn adapter_for(family: ProviderFamily) -> Option<&'static dyn ProviderAdapter> {
    ADAPTERS.get(&family).map(|a| a.as_ref())
}

/// Default endpoint base for families with a fixed public API
pub fn default_base_url(family: ProviderFamily) -> Option<&'static str> {
    match family {
        ProviderFamily::Moonshot => Some(endpoints::MOONSHOT_BASE_URL),
        ProviderFamily::ChatGlm => Some(endpoints::CHATGLM_API_URL),
        ProviderFamily::DeepSeek => Some(endpoints::DEEPSEEK_BASE_URL),
        ProviderFamily::OpenRouter => Some(endpoints::OPENROUTER_BASE_URL),
        ProviderFamily::Aiml => Some(endpoints::AIML_BASE_URL),
        _ => None,
    }
}

/// The configured base, or a `ConfigError` naming the family
pub(crate) fn require_base(config: &AiClientConfig) -> Result<&str, ApiError> {
    let base = config.trimmed_base();
    if base.is_empty() {
        return Err(ApiError::config(format!(
            "no API URL configured for {}",
            config.family
        )));
    }
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_family_has_an_adapter() {
        for family in ProviderFamily::all() {
            let adapter = adapter_for(*family).unwrap();
            assert_eq!(adapter.family(), *family);
        }
    }

    #[test]
    fn test_require_base() {
        let empty = AiClientConfig::new(ProviderFamily::Custom, "m", "  ");
        assert_eq!(
            require_base(&empty).unwrap_err().kind,
            crate::ai::error::ErrorKind::ConfigError
        );
        let set = AiClientConfig::new(ProviderFamily::Custom, "m", "http://x/");
        assert_eq!(require_base(&set).unwrap(), "http://x");
    }

    #[test]
    fn test_endpoints() {
        let cases = [
            (ProviderFamily::ChatgptApi, "https://api.openai.com", "https://api.openai.com/v1/chat/completions"),
            (ProviderFamily::GptCompletion, "https://api.openai.com", "https://api.openai.com/v1/completions"),
            (ProviderFamily::Claude, "https://api.anthropic.com", "https://api.anthropic.com/v1/messages"),
            (ProviderFamily::DeepSeek, endpoints::DEEPSEEK_BASE_URL, "https://api.deepseek.com/chat/completions"),
            (ProviderFamily::OpenRouter, endpoints::OPENROUTER_BASE_URL, "https://openrouter.ai/api/v1/chat/completions"),
            (ProviderFamily::Aiml, endpoints::AIML_BASE_URL, "https://api.aimlapi.com/v1/chat/completions"),
            (ProviderFamily::Moonshot, endpoints::MOONSHOT_BASE_URL, "https://api.moonshot.cn/v1/chat/completions"),
            (ProviderFamily::ChatGlm, endpoints::CHATGLM_API_URL, endpoints::CHATGLM_API_URL),
            (ProviderFamily::Ollama, "http://127.0.0.1:11434/", "http://127.0.0.1:11434/api/chat"),
            (ProviderFamily::Custom, "http://localhost:8000/v1/chat/completions", "http://localhost:8000/v1/chat/completions"),
            (ProviderFamily::GithubProxy, "http://127.0.0.1:3000/conversation", "http://127.0.0.1:3000/conversation"),
        ];
        for (family, base, expected) in cases {
            let config = AiClientConfig::new(family, "model", base);
            let adapter = adapter_for(family).unwrap();
            assert_eq!(adapter.endpoint(&config).unwrap(), expected, "{:?}", family);
        }
    }
}
