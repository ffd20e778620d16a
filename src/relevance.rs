//! Keyword-overlap relevance matching.
//!
//! An entry is relevant to an email when any whitespace token of its
//! case-folded question appears as a substring of the case-folded body.
//! Membership is boolean and the result preserves store order. This is
//! deliberately naive keyword overlap, not semantic search; the
//! low-precision policy is the contract.

use crate::knowledge::KnowledgeEntry;

/// Return the entries whose question shares a keyword with `body`.
///
/// An entry with an empty question has zero tokens and never matches.
pub fn find_relevant<'a>(body: &str, entries: &'a [KnowledgeEntry]) -> Vec<&'a KnowledgeEntry> {
    let body = body.to_lowercase();
    entries
        .iter()
        .filter(|entry| {
            entry
                .question
                .to_lowercase()
                .split_whitespace()
                .any(|token| body.contains(token))
        })
        .collect()
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

    #[test]
    fn test_empty_body_matches_nothing() {
        let store = vec![entry("refund policy", "30 days."), entry("shipping", "5 days.")];
        assert!(find_relevant("", &store).is_empty());
    }

    #[test]
    fn test_empty_store_matches_nothing() {
        assert!(find_relevant("any body at all", &[]).is_empty());
    }

    #[test]
    fn test_password_reset_overlap() {
        let store = vec![entry(
            "how do I reset my password",
            "Click forgot password.",
        )];
        let matched = find_relevant("Hi, I forgot my password, how do I reset it?", &store);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].answer, "Click forgot password.");
    }

    #[test]
    fn test_no_keyword_overlap() {
        let store = vec![entry("refund policy", "30 days.")];
        assert!(find_relevant("What is your shipping time?", &store).is_empty());
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let store = vec![entry("REFUND Policy", "30 days.")];
        let matched = find_relevant("Please explain the refund terms.", &store);
        assert_eq!(matched.len(), 1);
    }

    #[test]
    fn test_empty_question_never_matches() {
        let store = vec![entry("", "orphan"), entry("   ", "whitespace only")];
        assert!(find_relevant("anything", &store).is_empty());
    }

    #[test]
    fn test_result_preserves_store_order() {
        let store = vec![
            entry("billing cycle", "Monthly."),
            entry("refund policy", "30 days."),
            entry("billing address", "In settings."),
        ];
        let matched = find_relevant("A billing question about my refund.", &store);
        let questions: Vec<&str> = matched.iter().map(|e| e.question.as_str()).collect();
        assert_eq!(
            questions,
            vec!["billing cycle", "refund policy", "billing address"]
        );
    }

    #[test]
    fn test_substring_match_is_intentionally_loose() {
        // Token "it" matches inside "quite" — the policy is substring
        // containment, not word-boundary matching.
        let store = vec![entry("is it late", "No.")];
        let matched = find_relevant("quite a day", &store);
        assert_eq!(matched.len(), 1);
    }
}
