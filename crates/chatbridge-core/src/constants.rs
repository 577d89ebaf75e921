//! Application constants and configuration defaults
//!
//! Centralized location for magic numbers and default values

use std::time::Duration;

/// HTTP client configuration
pub mod http {
    use super::*;

    /// Connection timeout for HTTP requests
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Streaming timeout - long answers from slow models can run for minutes
    pub const STREAM_TIMEOUT: Duration = Duration::from_secs(600);

    /// User agent sent to every provider
    pub const USER_AGENT: &str = concat!("chatbridge/", env!("CARGO_PKG_VERSION"));

    /// Longest provider error body echoed back into an error message
    pub const MAX_ERROR_BODY_CHARS: usize = 500;
}

/// Provider endpoints that are not user-configurable
pub mod endpoints {
    pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
    pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
    pub const AIML_BASE_URL: &str = "https://api.aimlapi.com/v1";
    pub const MOONSHOT_BASE_URL: &str = "https://api.moonshot.cn/v1";
    pub const CHATGLM_API_URL: &str = "https://open.bigmodel.cn/api/paas/v4/chat/completions";

    /// API version header for Anthropic
    pub const ANTHROPIC_VERSION: &str = "2023-06-01";

    /// Azure OpenAI REST API version
    pub const AZURE_API_VERSION: &str = "2024-10-21";
}

/// Generation defaults
pub mod ai {
    /// Default model key when the config has none
    pub const DEFAULT_MODEL_KEY: &str = "chatgptApi35";

    /// Default maximum output tokens
    pub const MAX_RESPONSE_TOKENS: u32 = 2000;

    /// Default number of prior exchanges sent as context
    pub const MAX_CONTEXT_EXCHANGES: usize = 9;

    /// Default sampling temperature
    pub const TEMPERATURE: f32 = 1.0;

    /// Lifetime of a signed ChatGLM token
    pub const CHATGLM_TOKEN_TTL_MS: u64 = 60 * 60 * 1000;
}

/// Config directory layout
pub mod ui {
    /// Config directory name
    pub const CONFIG_DIR_NAME: &str = ".chatbridge";

    /// Environment variable selecting an alternate config file
    pub const CONFIG_ENV_VAR: &str = "CHATBRIDGE_CONFIG";
}
