//! Persisted user configuration
//!
//! `UserConfig` mirrors the extension's flat key-value settings. Every key
//! has a default, so any partial document loads into a complete config.
//! Keys this crate does not use are carried through untouched.

use anyhow::{anyhow, Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::constants;
use crate::paths;
use crate::session::ApiMode;

/// When the assistant answers automatically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TriggerMode {
    Always,
    QuestionMark,
    #[default]
    Manually,
}

/// User settings consumed by dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserConfig {
    // general
    pub trigger_mode: TriggerMode,
    /// Model key selected for new sessions
    pub model_name: String,
    pub api_mode: Option<ApiMode>,

    // credentials
    /// OpenAI API key
    pub api_key: String,
    pub azure_api_key: String,
    pub azure_endpoint: String,
    pub azure_deployment_name: String,
    pub claude_api_key: String,
    pub chatglm_api_key: String,
    pub moonshot_api_key: String,
    pub deep_seek_api_key: String,
    pub custom_api_key: String,
    pub open_router_api_key: String,
    pub aiml_api_key: String,

    // endpoints
    pub custom_model_api_url: String,
    pub custom_model_name: String,
    pub github_third_party_url: String,
    pub ollama_endpoint: String,
    pub ollama_model_name: String,
    pub ollama_api_key: String,
    pub ollama_keep_alive_time: String,
    pub custom_open_ai_api_url: String,
    pub custom_claude_api_url: String,

    // advanced
    pub max_response_token_length: u32,
    /// Prior exchanges (user + assistant pairs) sent as context
    pub max_conversation_context_length: usize,
    pub temperature: f32,
    /// Stream answers token by token; off means one response per request
    pub stream_responses: bool,

    /// Settings owned by other components
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            trigger_mode: TriggerMode::default(),
            model_name: constants::ai::DEFAULT_MODEL_KEY.to_string(),
            api_mode: None,

            api_key: String::new(),
            azure_api_key: String::new(),
            azure_endpoint: String::new(),
            azure_deployment_name: String::new(),
            claude_api_key: String::new(),
            chatglm_api_key: String::new(),
            moonshot_api_key: String::new(),
            deep_seek_api_key: String::new(),
            custom_api_key: String::new(),
            open_router_api_key: String::new(),
            aiml_api_key: String::new(),

            custom_model_api_url: "http://localhost:8000/v1/chat/completions".to_string(),
            custom_model_name: "gpt-4.1".to_string(),
            github_third_party_url: "http://127.0.0.1:3000/conversation".to_string(),
            ollama_endpoint: "http://127.0.0.1:11434".to_string(),
            ollama_model_name: "llama4".to_string(),
            ollama_api_key: String::new(),
            ollama_keep_alive_time: "5m".to_string(),
            custom_open_ai_api_url: "https://api.openai.com".to_string(),
            custom_claude_api_url: "https://api.anthropic.com".to_string(),

            max_response_token_length: constants::ai::MAX_RESPONSE_TOKENS,
            max_conversation_context_length: constants::ai::MAX_CONTEXT_EXCHANGES,
            temperature: constants::ai::TEMPERATURE,
            stream_responses: true,

            extra: Map::new(),
        }
    }
}

impl UserConfig {
    /// Parse a config document, filling in defaults for missing keys
    pub fn from_json(contents: &str) -> Result<Self> {
        let config = serde_json::from_str(contents)?;
        Ok(config)
    }

    /// Apply a partial update; keys not in `patch` keep their value
    pub fn merged(&self, patch: &Value) -> Result<Self> {
        let Value::Object(patch) = patch else {
            return Err(anyhow!("config update must be a JSON object"));
        };
        let mut current = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => return Err(anyhow!("config did not serialize to an object")),
        };
        for (key, value) in patch {
            current.insert(key.clone(), value.clone());
        }
        let updated: UserConfig = serde_json::from_value(Value::Object(current))
            .context("invalid config value")?;
        Ok(updated)
    }

    /// Copy with every credential blanked, for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for key in [
            &mut copy.api_key,
            &mut copy.azure_api_key,
            &mut copy.claude_api_key,
            &mut copy.chatglm_api_key,
            &mut copy.moonshot_api_key,
            &mut copy.deep_seek_api_key,
            &mut copy.custom_api_key,
            &mut copy.open_router_api_key,
            &mut copy.aiml_api_key,
            &mut copy.ollama_api_key,
        ] {
            if !key.is_empty() {
                *key = "********".to_string();
            }
        }
        if let Some(mode) = copy.api_mode.as_mut() {
            if !mode.api_key.is_empty() {
                mode.api_key = "********".to_string();
            }
        }
        copy
    }
}

/// Shared, persisted configuration
///
/// Readers take a snapshot `Arc`; a dispatch keeps its snapshot for the whole
/// generation, so later `set` calls never affect a request in flight.
pub struct ConfigStore {
    path: Option<PathBuf>,
    current: RwLock<Arc<UserConfig>>,
}

impl ConfigStore {
    /// Open the default config file (`~/.chatbridge/config.json` or `$CHATBRIDGE_CONFIG`)
    pub fn open_default() -> Result<Self> {
        Self::open(paths::config_file())
    }

    /// Open a config file; a missing file yields the defaults
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = Self::load_from_path(&path)?;
        Ok(Self {
            path: Some(path),
            current: RwLock::new(Arc::new(config)),
        })
    }

    /// A store that is never written to disk
    pub fn in_memory(config: UserConfig) -> Self {
        Self {
            path: None,
            current: RwLock::new(Arc::new(config)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current configuration
    pub fn snapshot(&self) -> Arc<UserConfig> {
        self.current.read().clone()
    }

    /// Merge a partial update, persist it, and publish the new snapshot
    pub fn set(&self, patch: &Value) -> Result<Arc<UserConfig>> {
        let mut current = self.current.write();
        let updated = current.merged(patch)?;
        if let Some(path) = &self.path {
            Self::save_to_path(&updated, path)?;
        }
        let updated = Arc::new(updated);
        *current = updated.clone();
        tracing::info!("Config updated ({} keys)", patch.as_object().map_or(0, |p| p.len()));
        Ok(updated)
    }

    /// Set a single key
    pub fn set_value(&self, key: &str, value: Value) -> Result<Arc<UserConfig>> {
        let mut patch = Map::new();
        patch.insert(key.to_string(), value);
        self.set(&Value::Object(patch))
    }

    /// Load a config from a specific path
    pub fn load_from_path(path: &Path) -> Result<UserConfig> {
        if !path.exists() {
            return Ok(UserConfig::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {:?}", path))?;
        if contents.trim().is_empty() {
            return Ok(UserConfig::default());
        }
        UserConfig::from_json(&contents).with_context(|| format!("failed to parse config {:?}", path))
    }

    /// Save a config to a specific path
    ///
    /// Writes a temp file and renames it over the original. On Unix the file
    /// is restricted to 0600 since it holds API keys.
    pub fn save_to_path(config: &UserConfig, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");
        let contents = serde_json::to_string_pretty(config)?;
        fs::write(&temp_path, contents)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))
                .map_err(|e| anyhow!("Failed to set secure file permissions: {}", e))?;
        }

        fs::rename(&temp_path, path)?;
        tracing::debug!("Config saved atomically to {:?}", path);
        Ok(())
    }
}
