//! Ollama adapter (native `/api/chat`, NDJSON streaming)

use serde_json::{json, Value};

use super::{require_base, ProviderAdapter};
use crate::ai::client::config::{AiClientConfig, CallOptions};
use crate::ai::error::ApiError;
use crate::ai::format::ollama::OllamaFormat;
use crate::ai::format::FormatHandler;
use crate::ai::parsers::OllamaParser;
use crate::ai::providers::ProviderFamily;
use crate::ai::sse::{Framing, SseParser};
use crate::ai::types::ChatMessage;

#[derive(Debug, Clone, Copy, Default)]
pub struct OllamaAdapter;

impl ProviderAdapter for OllamaAdapter {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::Ollama
    }

    fn requires_api_key(&self) -> bool {
        false
    }

    fn framing(&self) -> Framing {
        Framing::Ndjson
    }

    fn endpoint(&self, config: &AiClientConfig) -> Result<String, ApiError> {
        Ok(format!("{}/api/chat", require_base(config)?))
    }

    fn build_body(
        &self,
        config: &AiClientConfig,
        messages: &[ChatMessage],
        options: &CallOptions,
    ) -> Value {
        let mut body = OllamaFormat::new().build_request_body(&config.model, messages, options);
        if let Some(keep_alive) = config.keep_alive.as_deref().filter(|k| !k.trim().is_empty()) {
            body["keep_alive"] = json!(keep_alive.trim());
        }
        body
    }

    fn parser(&self) -> Box<dyn SseParser> {
        Box::new(OllamaParser::new())
    }

    fn parse_batch(&self, response: &Value) -> Result<String, ApiError> {
        OllamaFormat::new().extract_text(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_alive() {
        let mut config = AiClientConfig::new(ProviderFamily::Ollama, "llama4", "http://127.0.0.1:11434");
        let options = CallOptions::default();
        let body = OllamaAdapter.build_body(&config, &[ChatMessage::user("hi")], &options);
        assert!(body.get("keep_alive").is_none());

        config.keep_alive = Some("5m".to_string());
        let body = OllamaAdapter.build_body(&config, &[ChatMessage::user("hi")], &options);
        assert_eq!(body["keep_alive"], "5m");
    }
}
