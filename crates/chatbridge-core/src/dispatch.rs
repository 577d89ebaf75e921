//! Dispatch router
//!
//! Turns a `Session` plus a config snapshot into exactly one provider call.
//! Credentials and endpoints are resolved here, so adapters never look at
//! the user config.

use reqwest::Client;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::ai::adapters::{adapter_for, default_base_url};
use crate::ai::client::{AiClient, AiClientConfig, CallOptions};
use crate::ai::error::ApiError;
use crate::ai::models;
use crate::ai::providers::{classify, ProviderFamily};
use crate::ai::streaming::{EventSink, StreamEvent};
use crate::config::UserConfig;
use crate::session::Session;

/// Endpoint and credential resolved for one session
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub client: AiClientConfig,
    pub api_key: String,
}

/// Resolve family, model name, endpoint and key for a session
///
/// The session's `apiMode` wins over the config when its value is
/// non-empty. URL and key overrides only apply to the custom family; the
/// name override applies to every user-named family.
pub fn resolve(session: &Session, config: &UserConfig) -> Resolved {
    let family = classify(session);
    let mode = session.api_mode.as_ref();
    let name_override = mode.and_then(|m| m.name_override());

    let model = match family {
        ProviderFamily::Custom => name_override.unwrap_or(config.custom_model_name.as_str()),
        ProviderFamily::Ollama => name_override.unwrap_or(config.ollama_model_name.as_str()),
        ProviderFamily::Azure => name_override.unwrap_or(config.azure_deployment_name.as_str()),
        // unknown keys fall back to the OpenAI chat API with the raw key as model
        _ => models::model_name(&session.model_key).unwrap_or(session.model_key.trim()),
    };

    let base_url = match family {
        ProviderFamily::ChatgptApi | ProviderFamily::GptCompletion => {
            config.custom_open_ai_api_url.as_str()
        }
        ProviderFamily::Claude => config.custom_claude_api_url.as_str(),
        ProviderFamily::Ollama => config.ollama_endpoint.as_str(),
        ProviderFamily::Azure => config.azure_endpoint.as_str(),
        ProviderFamily::Custom => mode
            .and_then(|m| m.url_override())
            .unwrap_or(config.custom_model_api_url.as_str()),
        ProviderFamily::GithubProxy => config.github_third_party_url.as_str(),
        other => default_base_url(other).unwrap_or_default(),
    };

    let api_key = match family {
        ProviderFamily::ChatgptApi | ProviderFamily::GptCompletion => config.api_key.as_str(),
        ProviderFamily::Claude => config.claude_api_key.as_str(),
        ProviderFamily::Moonshot => config.moonshot_api_key.as_str(),
        ProviderFamily::ChatGlm => config.chatglm_api_key.as_str(),
        ProviderFamily::DeepSeek => config.deep_seek_api_key.as_str(),
        ProviderFamily::OpenRouter => config.open_router_api_key.as_str(),
        ProviderFamily::Aiml => config.aiml_api_key.as_str(),
        ProviderFamily::Ollama => config.ollama_api_key.as_str(),
        ProviderFamily::Azure => config.azure_api_key.as_str(),
        ProviderFamily::Custom => mode
            .and_then(|m| m.key_override())
            .unwrap_or(config.custom_api_key.as_str()),
        ProviderFamily::GithubProxy => "",
    };

    let mut client = AiClientConfig::new(family, model.trim(), base_url.trim());
    client.streaming = config.stream_responses;
    if family == ProviderFamily::Ollama && !config.ollama_keep_alive_time.trim().is_empty() {
        client.keep_alive = Some(config.ollama_keep_alive_time.trim().to_string());
    }

    Resolved {
        client,
        api_key: api_key.trim().to_string(),
    }
}

/// Generation parameters with config fallbacks
pub fn call_options(session: &Session, config: &UserConfig) -> CallOptions {
    CallOptions {
        max_tokens: session
            .generation_params
            .max_tokens
            .unwrap_or(config.max_response_token_length),
        temperature: session
            .generation_params
            .temperature
            .unwrap_or(config.temperature),
        stream: config.stream_responses,
    }
}

/// Routes sessions to providers over a shared connection pool
#[derive(Clone)]
pub struct Dispatcher {
    http: Client,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_client(AiClient::create_http_client())
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    /// Build the client for a session, failing before any network call
    ///
    /// A missing endpoint is a `ConfigError`; a missing key for a provider
    /// that needs one is an `AuthError`.
    pub fn prepare(&self, session: &Session, config: &UserConfig) -> Result<AiClient, ApiError> {
        let Resolved { client, api_key } = resolve(session, config);
        let family = client.family;
        let adapter = adapter_for(family)
            .ok_or_else(|| ApiError::unsupported(format!("no adapter registered for {}", family)))?;

        if client.model.is_empty() {
            return Err(ApiError::config(format!("no model name configured for {}", family)));
        }
        adapter.endpoint(&client)?;
        if adapter.requires_api_key() && api_key.is_empty() {
            return Err(ApiError::auth(format!("no API key configured for {}", family)));
        }

        AiClient::new(self.http.clone(), client, api_key)
    }

    /// Run one session to completion, writing every event into `sink`
    pub async fn run(&self, session: &Session, config: &UserConfig, sink: &mut EventSink) {
        let client = match self.prepare(session, config) {
            Ok(client) => client,
            Err(e) => {
                warn!("Dispatch rejected for {}: {}", session.model_key, e);
                sink.fail(e);
                return;
            }
        };
        info!(
            "Dispatching session {} to {} ({})",
            session.session_id,
            client.config().family,
            client.config().model
        );
        let messages = session.messages(config.max_conversation_context_length);
        let options = call_options(session, config);
        client.generate(&messages, &options, sink).await;
    }

    /// Spawn one session and return its event stream
    ///
    /// The config snapshot is held for the whole generation. Cancelling
    /// `cancel`, or dropping the receiver, aborts the request.
    pub fn dispatch(
        &self,
        session: Session,
        config: Arc<UserConfig>,
        cancel: CancellationToken,
    ) -> mpsc::UnboundedReceiver<StreamEvent> {
        let (mut sink, rx) = EventSink::channel(cancel);
        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher.run(&session, &config, &mut sink).await;
        });
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::error::ErrorKind;
    use crate::session::{ApiMode, GenerationParams};

    fn custom_session(url: &str, key: &str) -> Session {
        Session::new("customModel", "hi").with_api_mode(ApiMode {
            custom_url: url.into(),
            api_key: key.into(),
            custom_name: String::new(),
        })
    }

    #[test]
    fn test_custom_override_precedence() {
        for override_set in [true, false] {
            for config_set in [true, false] {
                let config = UserConfig {
                    custom_model_api_url: if config_set { "http://config/v1".into() } else { String::new() },
                    custom_api_key: if config_set { "config-key".into() } else { String::new() },
                    ..UserConfig::default()
                };
                let session = if override_set {
                    custom_session("http://session/v1", "session-key")
                } else {
                    custom_session("", "")
                };
                let resolved = resolve(&session, &config);
                let (url, key) = match (override_set, config_set) {
                    (true, _) => ("http://session/v1", "session-key"),
                    (false, true) => ("http://config/v1", "config-key"),
                    (false, false) => ("", ""),
                };
                assert_eq!(resolved.client.base_url, url);
                assert_eq!(resolved.api_key, key);
            }
        }
    }

    #[test]
    fn test_override_ignored_outside_custom_family() {
        let config = UserConfig {
            claude_api_key: "claude-key".into(),
            ..UserConfig::default()
        };
        let session = Session::new("claude37SonnetApi", "hi").with_api_mode(ApiMode {
            custom_url: "http://elsewhere".into(),
            api_key: "other".into(),
            custom_name: String::new(),
        });
        let resolved = resolve(&session, &config);
        assert_eq!(resolved.client.family, ProviderFamily::Claude);
        assert_eq!(resolved.client.base_url, "https://api.anthropic.com");
        assert_eq!(resolved.api_key, "claude-key");
    }

    #[test]
    fn test_user_named_models() {
        let config = UserConfig {
            azure_deployment_name: "prod-gpt".into(),
            ..UserConfig::default()
        };
        let ollama = resolve(&Session::new("ollamaModel", "hi"), &config);
        assert_eq!(ollama.client.model, "llama4");
        assert_eq!(ollama.client.keep_alive.as_deref(), Some("5m"));

        let azure = resolve(&Session::new("azureOpenAi", "hi"), &config);
        assert_eq!(azure.client.model, "prod-gpt");

        let named = Session::new("ollamaModel", "hi").with_api_mode(ApiMode {
            custom_name: "qwen3".into(),
            ..ApiMode::default()
        });
        assert_eq!(resolve(&named, &config).client.model, "qwen3");
    }

    #[test]
    fn test_unknown_key_falls_back_to_openai() {
        let config = UserConfig {
            api_key: "sk".into(),
            ..UserConfig::default()
        };
        let resolved = resolve(&Session::new("someFutureModel", "hi"), &config);
        assert_eq!(resolved.client.family, ProviderFamily::ChatgptApi);
        assert_eq!(resolved.client.model, "someFutureModel");
        assert_eq!(resolved.api_key, "sk");
    }

    #[test]
    fn test_fixed_endpoints_use_defaults() {
        let resolved = resolve(&Session::new("deepseek_chat", "hi"), &UserConfig::default());
        assert_eq!(resolved.client.family, ProviderFamily::DeepSeek);
        assert_eq!(resolved.client.base_url, "https://api.deepseek.com");
    }

    #[test]
    fn test_call_options_fallbacks() {
        let config = UserConfig {
            temperature: 0.4,
            max_response_token_length: 300,
            ..UserConfig::default()
        };
        let plain = call_options(&Session::new("chatgptApi5", "hi"), &config);
        assert_eq!(plain.temperature, 0.4);
        assert_eq!(plain.max_tokens, 300);

        let tuned = Session::new("chatgptApi5", "hi").with_params(GenerationParams {
            temperature: Some(0.9),
            max_tokens: None,
        });
        let options = call_options(&tuned, &config);
        assert_eq!(options.temperature, 0.9);
        assert_eq!(options.max_tokens, 300);
    }

    #[test]
    fn test_prepare_preflight_errors() {
        let dispatcher = Dispatcher::new();
        let config = UserConfig {
            custom_model_api_url: String::new(),
            ..UserConfig::default()
        };

        let err = dispatcher
            .prepare(&Session::new("customModel", "hi"), &config)
            .err()
            .unwrap();
        assert_eq!(err.kind, ErrorKind::ConfigError);

        let err = dispatcher
            .prepare(&Session::new("claude37SonnetApi", "hi"), &config)
            .err()
            .unwrap();
        assert_eq!(err.kind, ErrorKind::AuthError);

        // no key needed for local endpoints
        assert!(dispatcher.prepare(&Session::new("ollamaModel", "hi"), &config).is_ok());
    }
}
