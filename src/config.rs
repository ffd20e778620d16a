//! Local configuration (~/.mailpilot/config.json).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::AssistantError;

/// Completion endpoint used when the config does not override it.
pub const DEFAULT_COMPLETION_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
/// Completion model used when the config does not override it.
pub const DEFAULT_COMPLETION_MODEL: &str = "llama-3.1-70b-versatile";

/// Environment variable consulted before the config file for the API key.
pub const API_KEY_ENV: &str = "MAILPILOT_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// API key for the chat-completion service.
    pub completion_api_key: Option<String>,
    /// Model name; defaults to `DEFAULT_COMPLETION_MODEL`.
    pub completion_model: Option<String>,
    /// Chat-completions endpoint; defaults to `DEFAULT_COMPLETION_ENDPOINT`.
    pub completion_endpoint: Option<String>,
    /// Knowledge base file; defaults to `~/.mailpilot/knowledge.json`.
    pub knowledge_base_path: Option<String>,
}

impl Config {
    /// Resolve the completion API key: environment first, then config.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.completion_api_key.clone())
    }

    pub fn resolved_model(&self) -> &str {
        self.completion_model
            .as_deref()
            .unwrap_or(DEFAULT_COMPLETION_MODEL)
    }

    pub fn resolved_endpoint(&self) -> &str {
        self.completion_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_COMPLETION_ENDPOINT)
    }

    /// Resolve the knowledge base path: config override or the state dir.
    pub fn knowledge_base_path(&self) -> Result<PathBuf, AssistantError> {
        match &self.knowledge_base_path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Ok(state_dir()?.join("knowledge.json")),
        }
    }
}

/// Get the state directory (~/.mailpilot), creating it if needed.
pub fn state_dir() -> Result<PathBuf, AssistantError> {
    let home = dirs::home_dir()
        .ok_or_else(|| AssistantError::Config("Could not find home directory".into()))?;
    let state_dir = home.join(".mailpilot");
    if !state_dir.exists() {
        std::fs::create_dir_all(&state_dir)?;
    }
    Ok(state_dir)
}

/// Get the canonical config file path (~/.mailpilot/config.json).
pub fn config_path() -> Result<PathBuf, AssistantError> {
    Ok(state_dir()?.join("config.json"))
}

/// Load configuration; a missing file is the default config.
pub fn load_config() -> Result<Config, AssistantError> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(&path)?;
    serde_json::from_str(&content)
        .map_err(|e| AssistantError::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write configuration back to disk, pretty-printed.
pub fn save_config(config: &Config) -> Result<(), AssistantError> {
    let path = config_path()?;
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| AssistantError::Config(format!("Failed to serialize config: {}", e)))?;
    crate::util::atomic_write_str(&path, &content)?;
    Ok(())
}
