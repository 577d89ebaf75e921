//! OpenAI legacy text completion adapter (`gptApiInstruct`, `gptApiDavinci`)

use serde_json::Value;

use super::{require_base, ProviderAdapter};
use crate::ai::client::config::{AiClientConfig, CallOptions};
use crate::ai::error::ApiError;
use crate::ai::format::openai::CompletionFormat;
use crate::ai::format::FormatHandler;
use crate::ai::parsers::OpenAIParser;
use crate::ai::providers::ProviderFamily;
use crate::ai::sse::SseParser;
use crate::ai::types::ChatMessage;

#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionAdapter;

impl ProviderAdapter for CompletionAdapter {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::GptCompletion
    }

    fn endpoint(&self, config: &AiClientConfig) -> Result<String, ApiError> {
        Ok(format!("{}/v1/completions", require_base(config)?))
    }

    fn build_body(
        &self,
        config: &AiClientConfig,
        messages: &[ChatMessage],
        options: &CallOptions,
    ) -> Value {
        CompletionFormat::new().build_request_body(&config.model, messages, options)
    }

    fn parser(&self) -> Box<dyn SseParser> {
        Box::new(OpenAIParser::completion())
    }

    fn parse_batch(&self, response: &Value) -> Result<String, ApiError> {
        CompletionFormat::new().extract_text(response)
    }
}
