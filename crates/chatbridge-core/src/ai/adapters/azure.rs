//! Azure OpenAI adapter
//!
//! The deployment name stands in for the model and is part of the path;
//! the key goes in an `api-key` header.

use serde_json::Value;
use url::Url;

use super::{require_base, ProviderAdapter};
use crate::ai::client::config::{AiClientConfig, CallOptions};
use crate::ai::error::ApiError;
use crate::ai::format::openai::OpenAIFormat;
use crate::ai::format::FormatHandler;
use crate::ai::parsers::OpenAIParser;
use crate::ai::providers::{AuthHeader, ProviderFamily};
use crate::ai::sse::SseParser;
use crate::ai::types::ChatMessage;
use crate::constants::endpoints;

#[derive(Debug, Clone, Copy, Default)]
pub struct AzureAdapter;

impl ProviderAdapter for AzureAdapter {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::Azure
    }

    fn auth_header(&self) -> AuthHeader {
        AuthHeader::AzureApiKey
    }

    fn endpoint(&self, config: &AiClientConfig) -> Result<String, ApiError> {
        let base = require_base(config)?;
        let deployment = config.model.trim();
        if deployment.is_empty() {
            return Err(ApiError::config("no Azure deployment name configured"));
        }

        let mut url = Url::parse(&format!(
            "{}/openai/deployments/{}/chat/completions",
            base, deployment
        ))
        .map_err(|e| ApiError::config(format!("invalid Azure endpoint {:?}: {}", base, e)))?;
        url.query_pairs_mut()
            .append_pair("api-version", endpoints::AZURE_API_VERSION);
        Ok(url.into())
    }

    fn build_body(
        &self,
        config: &AiClientConfig,
        messages: &[ChatMessage],
        options: &CallOptions,
    ) -> Value {
        OpenAIFormat::new().build_request_body(&config.model, messages, options)
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
    use crate::ai::error::ErrorKind;

    #[test]
    fn test_endpoint_with_api_version() {
        let config = AiClientConfig::new(ProviderFamily::Azure, "my-gpt4", "https://example.openai.azure.com/");
        let url = AzureAdapter.endpoint(&config).unwrap();
        assert_eq!(
            url,
            format!(
                "https://example.openai.azure.com/openai/deployments/my-gpt4/chat/completions?api-version={}",
                endpoints::AZURE_API_VERSION
            )
        );
    }

    #[test]
    fn test_missing_deployment_is_config_error() {
        let config = AiClientConfig::new(ProviderFamily::Azure, "", "https://example.openai.azure.com");
        assert_eq!(AzureAdapter.endpoint(&config).unwrap_err().kind, ErrorKind::ConfigError);
    }

    #[test]
    fn test_invalid_endpoint_is_config_error() {
        let config = AiClientConfig::new(ProviderFamily::Azure, "dep", "not a url");
        assert_eq!(AzureAdapter.endpoint(&config).unwrap_err().kind, ErrorKind::ConfigError);
    }
}
