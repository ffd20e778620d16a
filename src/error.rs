//! Error types for assistant operations
//!
//! Errors are classified by what resolves them:
//! - Auth: no valid Google credential — one-time setup required
//! - Transport: network or remote-API failure — re-trigger manually
//! - MalformedStore / MalformedUpload: bad JSON shape, store untouched
//! - Config: missing or invalid local configuration

use thiserror::Error;

use crate::google_api::GoogleApiError;

/// Error type surfaced to the user by every assistant operation.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Not authenticated with Gmail: {0}")]
    Auth(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Knowledge base is malformed: {0}")]
    MalformedStore(String),

    #[error("Import rejected: {0}")]
    MalformedUpload(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AssistantError {
    /// Returns true if resolving this error needs a user action
    /// (as opposed to simply re-triggering the operation).
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            AssistantError::Auth(_)
                | AssistantError::Config(_)
                | AssistantError::MalformedStore(_)
                | AssistantError::MalformedUpload(_)
        )
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AssistantError::Auth(_) => "Run 'mailpilot setup' to authenticate with Gmail.",
            AssistantError::Transport(_) => "Check your internet connection and try again.",
            AssistantError::MalformedStore(_) => {
                "Fix or remove the knowledge base file; it must be a JSON list of \
                 {\"question\", \"answer\"} objects."
            }
            AssistantError::MalformedUpload(_) => {
                "The import file must be a JSON list of {\"question\", \"answer\"} objects."
            }
            AssistantError::Config(_) => "Check your configuration in ~/.mailpilot/config.json",
            AssistantError::Io(_) => "Check file permissions and disk space.",
        }
    }
}

impl From<GoogleApiError> for AssistantError {
    fn from(err: GoogleApiError) -> Self {
        match err {
            GoogleApiError::AuthExpired
            | GoogleApiError::TokenNotFound(_)
            | GoogleApiError::CredentialsNotFound(_)
            | GoogleApiError::FlowCancelled => AssistantError::Auth(err.to_string()),
            GoogleApiError::InvalidCredentials(_) => AssistantError::Config(err.to_string()),
            GoogleApiError::Io(io) => AssistantError::Io(io),
            GoogleApiError::Http(_)
            | GoogleApiError::Json(_)
            | GoogleApiError::RefreshFailed(_)
            | GoogleApiError::ApiError { .. } => AssistantError::Transport(err.to_string()),
        }
    }
}
