//! Assistant actions over a single email.
//!
//! Each action is independent and user-triggered: summarize, draft a
//! reply, or draft a reply grounded in matched knowledge base entries.
//! The grounded action calls the relevance matcher first and makes no
//! completion request when nothing matched.

use crate::completion::CompletionClient;
use crate::config::Config;
use crate::error::AssistantError;
use crate::google_api::gmail::EmailMessage;
use crate::knowledge::KnowledgeStore;
use crate::prompts;
use crate::relevance::find_relevant;

/// Outcome of a knowledge-grounded draft request.
pub enum GroundedDraft {
    /// No knowledge base entry shared a keyword with the email;
    /// no completion call was made.
    NoMatch,
    /// A draft grounded in `matched` entries.
    Draft { matched: usize, text: String },
}

pub struct Assistant {
    store: KnowledgeStore,
    config: Config,
}

impl Assistant {
    pub fn new(store: KnowledgeStore, config: Config) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    /// Completion client built on demand, so actions that never reach
    /// the completion API work without an API key.
    fn completion(&self) -> Result<CompletionClient, AssistantError> {
        CompletionClient::from_config(&self.config)
    }

    /// Request a summary of the email.
    pub async fn summarize(&self, email: &EmailMessage) -> Result<String, AssistantError> {
        self.completion()?
            .complete(&prompts::summary_prompt(&email.body))
            .await
    }

    /// Request a draft reply to the email.
    pub async fn draft_reply(&self, email: &EmailMessage) -> Result<String, AssistantError> {
        self.completion()?
            .complete(&prompts::reply_prompt(&email.body))
            .await
    }

    /// Request a draft reply grounded in the knowledge base.
    pub async fn grounded_draft(
        &self,
        email: &EmailMessage,
    ) -> Result<GroundedDraft, AssistantError> {
        let entries = self.store.load()?;
        let matched = find_relevant(&email.body, &entries);
        if matched.is_empty() {
            return Ok(GroundedDraft::NoMatch);
        }

        let prompt = prompts::grounded_reply_prompt(&matched, &email.body);
        let text = self.completion()?.complete(&prompt).await?;
        Ok(GroundedDraft::Draft {
            matched: matched.len(),
            text,
        })
    }
}
