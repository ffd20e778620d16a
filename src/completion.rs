//! Chat-completion client (OpenAI-compatible endpoint).
//!
//! One request per user action: a single user-role message carrying a
//! fixed instruction template plus the email text. Single attempt, no
//! retry; a hung remote call blocks the action that triggered it.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AssistantError;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

// ============================================================================
// Client
// ============================================================================

pub struct CompletionClient {
    endpoint: String,
    model: String,
    api_key: String,
}

impl CompletionClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Build a client from config; a missing API key is a config error
    /// naming the fix.
    pub fn from_config(config: &Config) -> Result<Self, AssistantError> {
        let api_key = config.resolved_api_key().ok_or_else(|| {
            AssistantError::Config(format!(
                "No completion API key set. Run 'mailpilot config --api-key <key>' \
                 or export {}.",
                crate::config::API_KEY_ENV
            ))
        })?;
        Ok(Self::new(
            config.resolved_endpoint(),
            config.resolved_model(),
            api_key,
        ))
    }

    /// Submit a single user-role message and return the completion text.
    pub async fn complete(&self, prompt: &str) -> Result<String, AssistantError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let client = reqwest::Client::new();
        let resp = client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AssistantError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AssistantError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(AssistantError::Transport(format!(
                "completion API returned HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        parse_completion(&body)
    }
}

/// Extract the first choice's message content from a response body.
fn parse_completion(body: &str) -> Result<String, AssistantError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| AssistantError::Transport(format!("invalid completion response: {}", e)))?;
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| AssistantError::Transport("completion response had no choices".into()))
}
