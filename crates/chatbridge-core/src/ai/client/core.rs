//! Core AI Client
//!
//! The main AiClient struct that handles API communication for one resolved
//! provider configuration. Request shaping is delegated to the family's
//! `ProviderAdapter`; this type owns the transport.

use reqwest::Client;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::config::{AiClientConfig, CallOptions};
use crate::ai::adapters::{adapter_for, ProviderAdapter};
use crate::ai::error::ApiError;
use crate::ai::glm;
use crate::ai::providers::AuthHeader;
use crate::ai::retry::parse_retry_after;
use crate::ai::streaming::EventSink;
use crate::ai::types::ChatMessage;
use crate::constants;

/// AI API client bound to one provider family
pub struct AiClient {
    http: Client,
    config: AiClientConfig,
    api_key: String,
    adapter: &'static dyn ProviderAdapter,
}

impl AiClient {
    /// Create the HTTP client with configuration suited to long SSE streams
    pub fn create_http_client() -> Client {
        Client::builder()
            .user_agent(constants::http::USER_AGENT)
            .connect_timeout(constants::http::CONNECT_TIMEOUT)
            .timeout(constants::http::STREAM_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                error!("Failed to build HTTP client: {}. Using default client.", e);
                Client::new()
            })
    }

    /// Create a client sharing an existing connection pool
    ///
    /// Fails with `UnsupportedModel` if no adapter is registered for the
    /// configured family.
    pub fn new(http: Client, config: AiClientConfig, api_key: String) -> Result<Self, ApiError> {
        let adapter = adapter_for(config.family).ok_or_else(|| {
            ApiError::unsupported(format!("no adapter registered for {}", config.family))
        })?;
        Ok(Self {
            http,
            config,
            api_key,
            adapter,
        })
    }

    /// Get the current configuration
    pub fn config(&self) -> &AiClientConfig {
        &self.config
    }

    pub fn adapter(&self) -> &'static dyn ProviderAdapter {
        self.adapter
    }

    /// Run one generation, writing every event into `sink`
    ///
    /// Always leaves the sink terminated: `Done`, `Error` or `Cancelled`.
    pub async fn generate(
        &self,
        messages: &[ChatMessage],
        options: &CallOptions,
        sink: &mut EventSink,
    ) {
        if self.config.streaming {
            self.call_streaming(messages, options, sink).await;
        } else {
            self.call_simple_into(messages, options, sink).await;
        }
    }

    /// Build a request with proper authentication headers
    pub(crate) fn build_request(&self, url: &str) -> Result<reqwest::RequestBuilder, ApiError> {
        let mut request = self.http.post(url);
        let key = self.api_key.trim();

        match self.adapter.auth_header() {
            AuthHeader::Bearer => {
                if !key.is_empty() {
                    request = request.header("authorization", format!("Bearer {}", key));
                }
            }
            AuthHeader::XApiKey => {
                request = request.header("x-api-key", key);
            }
            AuthHeader::AzureApiKey => {
                request = request.header("api-key", key);
            }
            AuthHeader::GlmToken => {
                let token = glm::generate_token(key, constants::ai::CHATGLM_TOKEN_TTL_MS)?;
                request = request.header("authorization", format!("Bearer {}", token));
            }
            AuthHeader::None => {}
        }
        debug!(
            "Using {:?} authentication for {}",
            self.adapter.auth_header(),
            self.config.family
        );

        for (name, value) in self.adapter.extra_headers() {
            request = request.header(*name, *value);
        }

        Ok(request.header("content-type", "application/json"))
    }

    /// Turn a non-success response into a classified error
    pub(crate) async fn handle_error_response(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let error_text = response.text().await.unwrap_or_default();
        let err = ApiError::from_response(status.as_u16(), &error_text, retry_after);
        warn!(
            "API error response from {}: {} ({})",
            self.config.family, status, err.kind
        );
        Err(err)
    }
}

/// Await `fut` unless `cancel` fires first
pub(crate) async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        output = fut => Some(output),
    }
}
