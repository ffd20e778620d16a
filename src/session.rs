//! Session-scoped review state.
//!
//! Holds the fetched email list and per-email artifacts keyed by the
//! Gmail message id. Everything here is ephemeral: a new fetch replaces
//! the list and drops all artifacts, and re-running an action
//! overwrites its previous result.

use std::collections::HashMap;

use crate::google_api::gmail::EmailMessage;

#[derive(Default)]
pub struct ReviewSession {
    emails: Vec<EmailMessage>,
    summaries: HashMap<String, String>,
    drafts: HashMap<String, String>,
}

impl ReviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the email list, discarding all prior artifacts.
    pub fn load(&mut self, emails: Vec<EmailMessage>) {
        self.emails = emails;
        self.summaries.clear();
        self.drafts.clear();
    }

    pub fn emails(&self) -> &[EmailMessage] {
        &self.emails
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    /// Look up an email by zero-based index.
    pub fn email(&self, index: usize) -> Option<&EmailMessage> {
        self.emails.get(index)
    }

    pub fn set_summary(&mut self, id: &str, text: String) {
        self.summaries.insert(id.to_string(), text);
    }

    pub fn summary(&self, id: &str) -> Option<&str> {
        self.summaries.get(id).map(String::as_str)
    }

    pub fn set_draft(&mut self, id: &str, text: String) {
        self.drafts.insert(id.to_string(), text);
    }

    pub fn draft(&self, id: &str) -> Option<&str> {
        self.drafts.get(id).map(String::as_str)
    }

    /// Consume the draft for a message (a sent draft is not reusable).
    pub fn take_draft(&mut self, id: &str) -> Option<String> {
        self.drafts.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(id: &str) -> EmailMessage {
        EmailMessage {
            id: id.to_string(),
            thread_id: format!("t-{}", id),
            sender: "jane@customer.com".to_string(),
            subject: "Hello".to_string(),
            date: "Sat, 8 Feb 2026 09:30:00 -0500".to_string(),
            body: "Hi there".to_string(),
        }
    }

    #[test]
    fn test_load_replaces_emails_and_drops_artifacts() {
        let mut session = ReviewSession::new();
        session.load(vec![email("m1")]);
        session.set_summary("m1", "old summary".into());
        session.set_draft("m1", "old draft".into());

        session.load(vec![email("m2")]);

        assert_eq!(session.emails().len(), 1);
        assert!(session.summary("m1").is_none());
        assert!(session.draft("m1").is_none());
    }

    #[test]
    fn test_repeat_action_overwrites() {
        let mut session = ReviewSession::new();
        session.load(vec![email("m1")]);
        session.set_draft("m1", "first".into());
        session.set_draft("m1", "second".into());
        assert_eq!(session.draft("m1"), Some("second"));
    }

    #[test]
    fn test_take_draft_consumes() {
        let mut session = ReviewSession::new();
        session.load(vec![email("m1")]);
        session.set_draft("m1", "outgoing".into());

        assert_eq!(session.take_draft("m1").as_deref(), Some("outgoing"));
        assert!(session.draft("m1").is_none());
    }

    #[test]
    fn test_index_lookup() {
        let mut session = ReviewSession::new();
        session.load(vec![email("m1"), email("m2")]);
        assert_eq!(session.email(1).unwrap().id, "m2");
        assert!(session.email(2).is_none());
    }
}
