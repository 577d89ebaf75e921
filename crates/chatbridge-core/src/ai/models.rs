//! Model registry
//!
//! Static table of every supported model key, the concrete model name sent
//! to the provider, and a human description. Keys with an empty model name
//! take theirs from the session or user config.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::providers::ProviderFamily;

/// One selectable model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelEntry {
    /// Identifier stored in sessions and config (`modelName`)
    pub key: &'static str,
    /// Model ID sent in API requests; empty for user-named models
    pub name: &'static str,
    /// Human-readable description
    pub desc: &'static str,
    pub family: ProviderFamily,
    /// Takes `max_completion_tokens` and only the default temperature
    pub reasoning: bool,
}

impl ModelEntry {
    const fn new(
        key: &'static str,
        name: &'static str,
        desc: &'static str,
        family: ProviderFamily,
    ) -> Self {
        Self {
            key,
            name,
            desc,
            family,
            reasoning: false,
        }
    }

    const fn reasoning(self) -> Self {
        Self {
            reasoning: true,
            ..self
        }
    }
}

static MODELS: &[ModelEntry] = &[
    // ChatgptApi
    ModelEntry::new("chatgptApi35", "gpt-3.5-turbo", "ChatGPT (GPT-3.5-turbo)", ProviderFamily::ChatgptApi),
    ModelEntry::new("chatgptApi35_16k", "gpt-3.5-turbo-16k", "ChatGPT (GPT-3.5-turbo-16k)", ProviderFamily::ChatgptApi),
    ModelEntry::new("chatgptApi4o_128k", "gpt-4o", "ChatGPT (GPT-4o, 128k)", ProviderFamily::ChatgptApi),
    ModelEntry::new("chatgptApi4oMini", "gpt-4o-mini", "ChatGPT (GPT-4o mini)", ProviderFamily::ChatgptApi),
    ModelEntry::new("chatgptApi4_8k", "gpt-4", "ChatGPT (GPT-4-8k)", ProviderFamily::ChatgptApi),
    ModelEntry::new("chatgptApi4_32k", "gpt-4-32k", "ChatGPT (GPT-4-32k)", ProviderFamily::ChatgptApi),
    ModelEntry::new("chatgptApi4_128k", "gpt-4-turbo", "ChatGPT (GPT-4-Turbo 128k)", ProviderFamily::ChatgptApi),
    ModelEntry::new("chatgptApi4_128k_preview", "gpt-4-turbo-preview", "ChatGPT (GPT-4-Turbo 128k Preview)", ProviderFamily::ChatgptApi),
    ModelEntry::new("chatgptApi4_128k_1106_preview", "gpt-4-1106-preview", "ChatGPT (GPT-4-Turbo 128k 1106 Preview)", ProviderFamily::ChatgptApi),
    ModelEntry::new("chatgptApi4_128k_0125_preview", "gpt-4-0125-preview", "ChatGPT (GPT-4-Turbo 128k 0125 Preview)", ProviderFamily::ChatgptApi),
    ModelEntry::new("chatgptApi4oLatest", "chatgpt-4o-latest", "ChatGPT (ChatGPT-4o latest)", ProviderFamily::ChatgptApi),
    ModelEntry::new("chatgptApi4_1", "gpt-4.1", "ChatGPT (GPT-4.1)", ProviderFamily::ChatgptApi),
    ModelEntry::new("chatgptApi4_1_mini", "gpt-4.1-mini", "ChatGPT (GPT-4.1 mini)", ProviderFamily::ChatgptApi),
    ModelEntry::new("chatgptApi4_1_nano", "gpt-4.1-nano", "ChatGPT (GPT-4.1 nano)", ProviderFamily::ChatgptApi),
    ModelEntry::new("chatgptApi5Mini", "gpt-5-mini", "ChatGPT (GPT-5 Mini)", ProviderFamily::ChatgptApi).reasoning(),
    ModelEntry::new("chatgptApi5", "gpt-5", "ChatGPT (GPT-5)", ProviderFamily::ChatgptApi).reasoning(),
    ModelEntry::new("chatgptApi5Pro", "gpt-5-pro", "ChatGPT (GPT-5 Pro)", ProviderFamily::ChatgptApi).reasoning(),
    ModelEntry::new("chatgptApi5ChatLatest", "gpt-5-chat-latest", "ChatGPT (GPT-5 Chat Latest)", ProviderFamily::ChatgptApi).reasoning(),
    // GptCompletion
    ModelEntry::new("gptApiInstruct", "gpt-3.5-turbo-instruct", "GPT-3.5-turbo Instruct", ProviderFamily::GptCompletion),
    ModelEntry::new("gptApiDavinci", "text-davinci-003", "GPT-3.5", ProviderFamily::GptCompletion),
    // Claude
    ModelEntry::new("claude12Api", "claude-instant-1.2", "Claude.ai (API, Claude Instant 1.2)", ProviderFamily::Claude),
    ModelEntry::new("claude2Api", "claude-2.0", "Claude.ai (API, Claude 2)", ProviderFamily::Claude),
    ModelEntry::new("claude21Api", "claude-2.1", "Claude.ai (API, Claude 2.1)", ProviderFamily::Claude),
    ModelEntry::new("claude3HaikuApi", "claude-3-haiku-20240307", "Claude.ai (API, Claude 3 Haiku)", ProviderFamily::Claude),
    ModelEntry::new("claude3SonnetApi", "claude-3-sonnet-20240229", "Claude.ai (API, Claude 3 Sonnet)", ProviderFamily::Claude),
    ModelEntry::new("claude3OpusApi", "claude-3-opus-20240229", "Claude.ai (API, Claude 3 Opus)", ProviderFamily::Claude),
    ModelEntry::new("claude35SonnetApi", "claude-3-5-sonnet-20241022", "Claude.ai (API, Claude 3.5 Sonnet)", ProviderFamily::Claude),
    ModelEntry::new("claude35HaikuApi", "claude-3-5-haiku-20241022", "Claude.ai (API, Claude 3.5 Haiku)", ProviderFamily::Claude),
    ModelEntry::new("claude37SonnetApi", "claude-3-7-sonnet-20250219", "Claude.ai (API, Claude 3.7 Sonnet)", ProviderFamily::Claude),
    ModelEntry::new("claudeOpus4Api", "claude-opus-4-20250514", "Claude.ai (API, Claude Opus 4)", ProviderFamily::Claude),
    ModelEntry::new("claudeOpus41Api", "claude-opus-4-1-20250805", "Claude.ai (API, Claude Opus 4.1)", ProviderFamily::Claude),
    ModelEntry::new("claudeSonnet4Api", "claude-sonnet-4-20250514", "Claude.ai (API, Claude Sonnet 4)", ProviderFamily::Claude),
    ModelEntry::new("claudeSonnet45Api", "claude-sonnet-4-5-20250929", "Claude.ai (API, Claude Sonnet 4.5)", ProviderFamily::Claude),
    ModelEntry::new("claudeHaiku45Api", "claude-haiku-4-5-20251001", "Claude.ai (API, Claude Haiku 4.5)", ProviderFamily::Claude),
    // Moonshot
    ModelEntry::new("moonshot_k2", "kimi-k2-0711-preview", "Kimi.Moonshot (k2)", ProviderFamily::Moonshot),
    ModelEntry::new("moonshot_kimi_latest", "kimi-latest", "Kimi.Moonshot (kimi-latest)", ProviderFamily::Moonshot),
    ModelEntry::new("moonshot_v1_8k", "moonshot-v1-8k", "Kimi.Moonshot (8k)", ProviderFamily::Moonshot),
    ModelEntry::new("moonshot_v1_32k", "moonshot-v1-32k", "Kimi.Moonshot (32k)", ProviderFamily::Moonshot),
    ModelEntry::new("moonshot_v1_128k", "moonshot-v1-128k", "Kimi.Moonshot (128k)", ProviderFamily::Moonshot),
    // ChatGlm
    ModelEntry::new("chatglmTurbo", "GLM-4-Air", "ChatGLM (GLM-4-Air, 128k)", ProviderFamily::ChatGlm),
    ModelEntry::new("chatglm4", "GLM-4-0520", "ChatGLM (GLM-4-0520, 128k)", ProviderFamily::ChatGlm),
    ModelEntry::new("chatglmEmohaa", "Emohaa", "ChatGLM (Emohaa)", ProviderFamily::ChatGlm),
    ModelEntry::new("chatglmCharGLM3", "CharGLM-3", "ChatGLM (CharGLM-3)", ProviderFamily::ChatGlm),
    // DeepSeek
    ModelEntry::new("deepseek_chat", "deepseek-chat", "DeepSeek (Chat)", ProviderFamily::DeepSeek),
    ModelEntry::new("deepseek_reasoner", "deepseek-reasoner", "DeepSeek (Reasoner)", ProviderFamily::DeepSeek),
    // Ollama
    ModelEntry::new("ollamaModel", "", "Ollama API", ProviderFamily::Ollama),
    // OpenRouter
    ModelEntry::new("openRouter_anthropic_claude_sonnet4", "anthropic/claude-sonnet-4", "OpenRouter (Claude Sonnet 4)", ProviderFamily::OpenRouter),
    ModelEntry::new("openRouter_anthropic_claude_sonnet4_5", "anthropic/claude-sonnet-4.5", "OpenRouter (Claude Sonnet 4.5)", ProviderFamily::OpenRouter),
    ModelEntry::new("openRouter_anthropic_claude_haiku4_5", "anthropic/claude-haiku-4.5", "OpenRouter (Claude Haiku 4.5)", ProviderFamily::OpenRouter),
    ModelEntry::new("openRouter_anthropic_claude_3_7_sonnet", "anthropic/claude-3.7-sonnet", "OpenRouter (Claude 3.7 Sonnet)", ProviderFamily::OpenRouter),
    ModelEntry::new("openRouter_google_gemini_2_5_pro", "google/gemini-2.5-pro", "OpenRouter (Gemini 2.5 Pro)", ProviderFamily::OpenRouter),
    ModelEntry::new("openRouter_google_gemini_2_5_flash", "google/gemini-2.5-flash", "OpenRouter (Gemini 2.5 Flash)", ProviderFamily::OpenRouter),
    ModelEntry::new("openRouter_openai_o3", "openai/o3", "OpenRouter (GPT-o3)", ProviderFamily::OpenRouter).reasoning(),
    ModelEntry::new("openRouter_openai_gpt_4_1_mini", "openai/gpt-4.1-mini", "OpenRouter (GPT-4.1 Mini)", ProviderFamily::OpenRouter),
    ModelEntry::new("openRouter_deepseek_deepseek_chat_v3_0324_free", "deepseek/deepseek-chat-v3-0324:free", "OpenRouter (DeepSeek Chat v3 Free)", ProviderFamily::OpenRouter),
    // Aiml
    ModelEntry::new("aiml_anthropic_claude_opus_4", "anthropic/claude-opus-4", "AIML (Claude Opus 4)", ProviderFamily::Aiml),
    ModelEntry::new("aiml_anthropic_claude_opus_4_1", "anthropic/claude-opus-4-1", "AIML (Claude Opus 4.1)", ProviderFamily::Aiml),
    ModelEntry::new("aiml_anthropic_claude_sonnet_4", "anthropic/claude-sonnet-4", "AIML (Claude Sonnet 4)", ProviderFamily::Aiml),
    ModelEntry::new("aiml_anthropic_claude_sonnet_4_5", "anthropic/claude-sonnet-4-5", "AIML (Claude Sonnet 4.5)", ProviderFamily::Aiml),
    ModelEntry::new("aiml_claude_3_7_sonnet_20250219", "claude-3-7-sonnet-20250219", "AIML (Claude 3.7 Sonnet)", ProviderFamily::Aiml),
    ModelEntry::new("aiml_google_gemini_2_5_pro_preview_05_06", "google/gemini-2.5-pro-preview-05-06", "AIML (Gemini 2.5 Pro)", ProviderFamily::Aiml),
    ModelEntry::new("aiml_google_gemini_2_5_flash_preview", "google/gemini-2.5-flash-preview", "AIML (Gemini 2.5 Flash)", ProviderFamily::Aiml),
    ModelEntry::new("aiml_openai_o3_2025_04_16", "openai/o3-2025-04-16", "AIML (GPT-o3)", ProviderFamily::Aiml).reasoning(),
    ModelEntry::new("aiml_openai_gpt_4_1_2025_04_14", "openai/gpt-4.1-2025-04-14", "AIML (GPT-4.1)", ProviderFamily::Aiml),
    ModelEntry::new("aiml_deepseek_deepseek_chat", "deepseek/deepseek-chat", "AIML (DeepSeek Chat)", ProviderFamily::Aiml),
    ModelEntry::new("aiml_moonshot_kimi_k2_preview", "moonshot/kimi-k2-preview", "AIML (Kimi K2)", ProviderFamily::Aiml),
    // Azure
    ModelEntry::new("azureOpenAi", "", "ChatGPT (Azure)", ProviderFamily::Azure),
    // Custom
    ModelEntry::new("customModel", "", "Custom Model", ProviderFamily::Custom),
    // GithubProxy
    ModelEntry::new("waylaidwandererApi", "", "Waylaidwanderer API (Github)", ProviderFamily::GithubProxy),
];

static MODEL_INDEX: LazyLock<HashMap<&'static str, &'static ModelEntry>> =
    LazyLock::new(|| MODELS.iter().map(|m| (m.key, m)).collect());

/// Every registered model, grouped by family
pub fn all_models() -> &'static [ModelEntry] {
    MODELS
}

/// Look up a model key
pub fn lookup(key: &str) -> Option<&'static ModelEntry> {
    MODEL_INDEX.get(key).copied()
}

/// Models belonging to one family, in registry order
pub fn models_for(family: ProviderFamily) -> impl Iterator<Item = &'static ModelEntry> {
    MODELS.iter().filter(move |m| m.family == family)
}

/// Concrete model name for a key
///
/// Unknown keys are passed through verbatim, matching the fallback that
/// routes them to the OpenAI chat API. User-named models return `None`.
pub fn model_name(key: &str) -> Option<&'static str> {
    match lookup(key) {
        Some(entry) if entry.name.is_empty() => None,
        Some(entry) => Some(entry.name),
        None => None,
    }
}

/// Whether a concrete model name belongs to the reasoning family
///
/// Only registry names are recognized; user-named deployments keep the
/// classic chat body.
pub fn is_reasoning_model(name: &str) -> bool {
    !name.is_empty() && MODELS.iter().any(|m| m.reasoning && m.name == name)
}
