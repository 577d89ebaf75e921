//! ChatGLM (BigModel) adapter
//!
//! OpenAI-shaped body and stream, signed JWT bearer token, and a narrower
//! temperature range.

use serde_json::{json, Value};

use super::{require_base, ProviderAdapter};
use crate::ai::client::config::{AiClientConfig, CallOptions};
use crate::ai::error::ApiError;
use crate::ai::format::openai::OpenAIFormat;
use crate::ai::format::FormatHandler;
use crate::ai::glm;
use crate::ai::parsers::OpenAIParser;
use crate::ai::providers::{AuthHeader, ProviderFamily};
use crate::ai::sse::SseParser;
use crate::ai::types::ChatMessage;

#[derive(Debug, Clone, Copy, Default)]
pub struct ChatGlmAdapter;

impl ProviderAdapter for ChatGlmAdapter {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::ChatGlm
    }

    fn auth_header(&self) -> AuthHeader {
        AuthHeader::GlmToken
    }

    fn endpoint(&self, config: &AiClientConfig) -> Result<String, ApiError> {
        require_base(config).map(str::to_string)
    }

    fn build_body(
        &self,
        config: &AiClientConfig,
        messages: &[ChatMessage],
        options: &CallOptions,
    ) -> Value {
        let mut body = OpenAIFormat::new().build_request_body(&config.model, messages, options);
        body["temperature"] = json!(glm::clamp_temperature(options.temperature));
        body
    }

    fn parser(&self) -> Box<dyn SseParser> {
        Box::new(OpenAIParser::chat())
    }

    fn parse_batch(&self, response: &Value) -> Result<String, ApiError> {
        OpenAIFormat::new().extract_text(response)
    }
}
