//! Anthropic Claude adapter

use serde_json::Value;

use super::{require_base, ProviderAdapter};
use crate::ai::client::config::{AiClientConfig, CallOptions};
use crate::ai::error::ApiError;
use crate::ai::format::anthropic::AnthropicFormat;
use crate::ai::format::FormatHandler;
use crate::ai::parsers::AnthropicParser;
use crate::ai::providers::{AuthHeader, ProviderFamily};
use crate::ai::sse::SseParser;
use crate::ai::types::ChatMessage;
use crate::constants::endpoints;

#[derive(Debug, Clone, Copy, Default)]
pub struct ClaudeAdapter;

impl ProviderAdapter for ClaudeAdapter {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::Claude
    }

    fn auth_header(&self) -> AuthHeader {
        AuthHeader::XApiKey
    }

    fn extra_headers(&self) -> &'static [(&'static str, &'static str)] {
        &[("anthropic-version", endpoints::ANTHROPIC_VERSION)]
    }

    fn endpoint(&self, config: &AiClientConfig) -> Result<String, ApiError> {
        Ok(format!("{}/v1/messages", require_base(config)?))
    }

    fn build_body(
        &self,
        config: &AiClientConfig,
        messages: &[ChatMessage],
        options: &CallOptions,
    ) -> Value {
        AnthropicFormat::new().build_request_body(&config.model, messages, options)
    }

    fn parser(&self) -> Box<dyn SseParser> {
        Box::new(AnthropicParser::new())
    }

    fn parse_batch(&self, response: &Value) -> Result<String, ApiError> {
        AnthropicFormat::new().extract_text(response)
    }
}
