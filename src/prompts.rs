//! Fixed instruction templates for the three assistant actions.

use crate::knowledge::KnowledgeEntry;

/// Summary request: instruction plus the raw email body.
pub fn summary_prompt(body: &str) -> String {
    format!("Summarize this email:\n\n{}", body)
}

/// Plain draft-reply request.
pub fn reply_prompt(body: &str) -> String {
    format!(
        "Write a concise, professional reply to the following email. \
         Return only the reply text, with no preamble.\n\n{}",
        body
    )
}

/// Knowledge-grounded draft: each matched question/answer pair is
/// concatenated as context before the original email body.
pub fn grounded_reply_prompt(matched: &[&KnowledgeEntry], body: &str) -> String {
    let mut prompt = String::from(
        "Use the following knowledge base entries to answer the email.\n\n",
    );
    for entry in matched {
        prompt.push_str(&format!("Q: {}\nA: {}\n\n", entry.question, entry.answer));
    }
    prompt.push_str(&format!(
        "Email:\n{}\n\nWrite a concise, professional reply grounded in the entries \
         above. Return only the reply text, with no preamble.",
        body
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_prompt_carries_body() {
        let prompt = summary_prompt("Hello there");
        assert!(prompt.starts_with("Summarize this email:"));
        assert!(prompt.ends_with("Hello there"));
    }

    #[test]
    fn test_grounded_prompt_contains_pairs_and_body() {
        let entries = vec![
            KnowledgeEntry {
                question: "refund policy".into(),
                answer: "30 days.".into(),
            },
            KnowledgeEntry {
                question: "shipping time".into(),
                answer: "5 business days.".into(),
            },
        ];
        let matched: Vec<&KnowledgeEntry> = entries.iter().collect();
        let prompt = grounded_reply_prompt(&matched, "When do refunds land?");

        assert!(prompt.contains("Q: refund policy\nA: 30 days."));
        assert!(prompt.contains("Q: shipping time\nA: 5 business days."));
        // Context precedes the email body
        let ctx_pos = prompt.find("Q: refund policy").unwrap();
        let body_pos = prompt.find("When do refunds land?").unwrap();
        assert!(ctx_pos < body_pos);
    }
}
