//! Stream parser implementations for different AI providers

mod anthropic;
mod github;
mod ollama;
mod openai;

pub use anthropic::AnthropicParser;
pub use github::GithubProxyParser;
pub use ollama::OllamaParser;
pub use openai::OpenAIParser;
