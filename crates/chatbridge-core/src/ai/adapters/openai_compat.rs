//! Chat-completions-compatible adapter
//!
//! OpenAI, DeepSeek, OpenRouter, AIML, Moonshot and user custom endpoints
//! all speak the same wire contract. They differ only in base URL, whether a
//! key is mandatory, and the temperature range they accept.

use serde_json::{json, Value};

use super::{require_base, ProviderAdapter};
use crate::ai::client::config::{AiClientConfig, CallOptions};
use crate::ai::error::ApiError;
use crate::ai::format::openai::OpenAIFormat;
use crate::ai::format::FormatHandler;
use crate::ai::parsers::OpenAIParser;
use crate::ai::providers::ProviderFamily;
use crate::ai::sse::SseParser;
use crate::ai::types::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Path {
    /// `{base}/v1/chat/completions`, base is a bare origin
    Versioned,
    /// `{base}/chat/completions`, base already carries the version
    Compatible,
    /// Base is the full URL
    Verbatim,
}

/// Adapter for OpenAI chat/completions and compatible APIs
#[derive(Debug, Clone)]
pub struct ChatCompletionsAdapter {
    family: ProviderFamily,
    path: Path,
    requires_key: bool,
    temperature_range: Option<(f32, f32)>,
}

impl ChatCompletionsAdapter {
    /// OpenAI itself; base is `customOpenAiApiUrl`
    pub fn chatgpt() -> Self {
        Self {
            family: ProviderFamily::ChatgptApi,
            path: Path::Versioned,
            requires_key: true,
            temperature_range: None,
        }
    }

    /// A hosted compatible API with a fixed versioned base URL
    pub fn compatible(family: ProviderFamily, temperature_range: Option<(f32, f32)>) -> Self {
        Self {
            family,
            path: Path::Compatible,
            requires_key: true,
            temperature_range,
        }
    }

    /// User-supplied endpoint; the URL is used as-is and the key is optional
    pub fn custom() -> Self {
        Self {
            family: ProviderFamily::Custom,
            path: Path::Verbatim,
            requires_key: false,
            temperature_range: None,
        }
    }
}

impl ProviderAdapter for ChatCompletionsAdapter {
    fn family(&self) -> ProviderFamily {
        self.family
    }

    fn requires_api_key(&self) -> bool {
        self.requires_key
    }

    fn endpoint(&self, config: &AiClientConfig) -> Result<String, ApiError> {
        let base = require_base(config)?;
        Ok(match self.path {
            Path::Versioned => format!("{}/v1/chat/completions", base),
            Path::Compatible => format!("{}/chat/completions", base),
            Path::Verbatim => base.to_string(),
        })
    }

    fn build_body(
        &self,
        config: &AiClientConfig,
        messages: &[ChatMessage],
        options: &CallOptions,
    ) -> Value {
        let mut body = OpenAIFormat::new().build_request_body(&config.model, messages, options);
        if let (Some((min, max)), Some(_)) = (self.temperature_range, body.get("temperature")) {
            body["temperature"] = json!(options.temperature.clamp(min, max));
        }
        body
    }

    fn parser(&self) -> Box<dyn SseParser> {
        Box::new(OpenAIParser::chat())
    }

    fn parse_batch(&self, response: &Value) -> Result<String, ApiError> {
        OpenAIFormat::new().extract_text(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moonshot_temperature_clamped() {
        let adapter = ChatCompletionsAdapter::compatible(ProviderFamily::Moonshot, Some((0.0, 1.0)));
        let config = AiClientConfig::new(ProviderFamily::Moonshot, "moonshot-v1-8k", "https://api.moonshot.cn/v1");
        let options = CallOptions {
            max_tokens: 10,
            temperature: 1.5,
            stream: true,
        };
        let body = adapter.build_body(&config, &[ChatMessage::user("hi")], &options);
        assert_eq!(body["temperature"], 1.0);
        assert_eq!(body["model"], "moonshot-v1-8k");
    }

    #[test]
    fn test_openrouter_o3_keeps_default_temperature() {
        let adapter = ChatCompletionsAdapter::compatible(ProviderFamily::OpenRouter, Some((0.0, 2.0)));
        let config = AiClientConfig::new(ProviderFamily::OpenRouter, "openai/o3", "https://openrouter.ai/api/v1");
        let options = CallOptions {
            max_tokens: 10,
            temperature: 1.5,
            stream: true,
        };
        let body = adapter.build_body(&config, &[ChatMessage::user("hi")], &options);
        assert!(body.get("temperature").is_none());
        assert_eq!(body["max_completion_tokens"], 10);
    }

    #[test]
    fn test_custom_key_optional() {
        assert!(!ChatCompletionsAdapter::custom().requires_api_key());
        assert!(ChatCompletionsAdapter::chatgpt().requires_api_key());
    }
}
