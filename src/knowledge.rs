//! FAQ-style knowledge base: a JSON list of question/answer pairs.
//!
//! The backing file is a single UTF-8 JSON document, pretty-printed with
//! 2-space indentation and literal unicode. Entries are append-only and
//! deduplicated by trimmed, case-folded question text. The whole
//! document is rewritten atomically on every update.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AssistantError;

/// One question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub question: String,
    pub answer: String,
}

/// Question text as used for uniqueness: trimmed and case-folded.
pub fn normalize_question(question: &str) -> String {
    question.trim().to_lowercase()
}

/// The persisted knowledge base.
pub struct KnowledgeStore {
    path: PathBuf,
}

impl KnowledgeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all entries.
    ///
    /// A missing file is an empty store. A file that is not a JSON list
    /// of objects each carrying string `question` and `answer` is a
    /// malformed store.
    pub fn load(&self) -> Result<Vec<KnowledgeEntry>, AssistantError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&content)
            .map_err(|e| AssistantError::MalformedStore(format!("{}: {}", self.path.display(), e)))
    }

    /// Append entries whose normalized question is new, then persist.
    ///
    /// Entries with an empty (after trimming) question are silently
    /// skipped. Returns the number of entries actually appended;
    /// calling twice with the same input yields N then 0.
    pub fn update(&self, new_entries: &[KnowledgeEntry]) -> Result<usize, AssistantError> {
        let mut entries = self.load()?;

        let mut seen: HashSet<String> = entries
            .iter()
            .map(|e| normalize_question(&e.question))
            .collect();

        let mut added = 0;
        for candidate in new_entries {
            let key = normalize_question(&candidate.question);
            if key.is_empty() || seen.contains(&key) {
                continue;
            }
            seen.insert(key);
            entries.push(candidate.clone());
            added += 1;
        }

        self.save(&entries)?;
        Ok(added)
    }

    /// The upload contract: parse a user-supplied JSON document and
    /// forward it to `update` iff it is a list of objects.
    ///
    /// Anything else is rejected without touching the on-disk store.
    /// Objects may omit `question` or `answer`; missing fields become
    /// empty strings and `update` skips questionless entries.
    pub fn import_json(&self, text: &str) -> Result<usize, AssistantError> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| AssistantError::MalformedUpload(format!("not valid JSON: {}", e)))?;

        let items = value.as_array().ok_or_else(|| {
            AssistantError::MalformedUpload("top-level JSON must be a list of objects".into())
        })?;

        let mut candidates = Vec::with_capacity(items.len());
        for item in items {
            let obj = item.as_object().ok_or_else(|| {
                AssistantError::MalformedUpload("every list element must be an object".into())
            })?;
            candidates.push(KnowledgeEntry {
                question: obj
                    .get("question")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                answer: obj
                    .get("answer")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
            });
        }

        self.update(&candidates)
    }

    /// Persist the full entry sequence, pretty-printed, via atomic rename.
    fn save(&self, entries: &[KnowledgeEntry]) -> Result<(), AssistantError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| AssistantError::MalformedStore(e.to_string()))?;
        crate::util::atomic_write_str(&self.path, &content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(question: &str, answer: &str) -> KnowledgeEntry {
        KnowledgeEntry {
            question: question.to_string(),
            answer: answer.to_string(),
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> KnowledgeStore {
        KnowledgeStore::new(dir.path().join("knowledge.json"))
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_update_appends_disjoint_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .update(&[entry("refund policy", "30 days."), entry("shipping", "5 days.")])
            .unwrap();

        let added = store
            .update(&[entry("warranty", "1 year."), entry("returns", "See refund policy.")])
            .unwrap();

        assert_eq!(added, 2);
        assert_eq!(store.load().unwrap().len(), 4);
    }

    #[test]
    fn test_update_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let batch = [entry("refund policy", "30 days."), entry("shipping", "5 days.")];

        assert_eq!(store.update(&batch).unwrap(), 2);
        assert_eq!(store.update(&batch).unwrap(), 0);
        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[test]
    fn test_update_dedups_by_normalized_question() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.update(&[entry("Refund Policy", "30 days.")]).unwrap();

        let added = store
            .update(&[entry("  refund policy  ", "different answer")])
            .unwrap();

        assert_eq!(added, 0);
        let entries = store.load().unwrap();
        assert_eq!(entries.len(), 1);
        // First writer wins; append-only, never edited in place
        assert_eq!(entries[0].answer, "30 days.");
    }

    #[test]
    fn test_update_skips_empty_question() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let added = store
            .update(&[entry("", "orphan answer"), entry("   ", "also orphan"), entry("real", "a")])
            .unwrap();

        assert_eq!(added, 1);
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_update_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.update(&[entry("first", "1")]).unwrap();
        store.update(&[entry("second", "2"), entry("third", "3")]).unwrap();

        let questions: Vec<String> = store
            .load()
            .unwrap()
            .into_iter()
            .map(|e| e.question)
            .collect();
        assert_eq!(questions, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_load_rejects_non_list_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{"question": "q", "answer": "a"}"#).unwrap();

        assert!(matches!(
            store.load(),
            Err(AssistantError::MalformedStore(_))
        ));
    }

    #[test]
    fn test_load_rejects_entry_missing_answer() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"[{"question": "q"}]"#).unwrap();

        assert!(matches!(
            store.load(),
            Err(AssistantError::MalformedStore(_))
        ));
    }

    #[test]
    fn test_import_rejects_object_and_leaves_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.update(&[entry("refund policy", "30 days.")]).unwrap();
        let before = std::fs::read(store.path()).unwrap();

        let result = store.import_json(r#"{"question": "q", "answer": "a"}"#);
        assert!(matches!(result, Err(AssistantError::MalformedUpload(_))));

        let after = std::fs::read(store.path()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_import_rejects_list_with_non_object_element() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let result = store.import_json(r#"[{"question": "q", "answer": "a"}, 42]"#);
        assert!(matches!(result, Err(AssistantError::MalformedUpload(_))));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_import_accepts_list_and_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let added = store
            .import_json(r#"[{"question": "reset password", "answer": "Click forgot password."}, {"answer": "no question here"}]"#)
            .unwrap();

        // The questionless object is skipped, not an error
        assert_eq!(added, 1);
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_persisted_format_is_pretty_with_literal_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.update(&[entry("café hours", "Open 9–17.")]).unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("  {")); // 2-space indentation
        assert!(content.contains("café")); // unicode written literally, not escaped
        assert!(!content.contains("\\u"));
    }
}
