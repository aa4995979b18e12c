//! Context injection: decide whether a user message needs memory, and if so
//! prepend the assembled context block.

use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::debug;

use crate::errors::Result;
use crate::graph::MemoryGraph;

static RECALL_CUE: OnceLock<Regex> = OnceLock::new();
static REFERENCE_CUE: OnceLock<Regex> = OnceLock::new();
static QUESTION_CUE: OnceLock<Regex> = OnceLock::new();

fn recall_cue() -> &'static Regex {
    RECALL_CUE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:remember|recall|you mentioned|we talked about|earlier|before|previously)\b")
            .unwrap()
    })
}

fn reference_cue() -> &'static Regex {
    REFERENCE_CUE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:he|she|it|they|this|that|the company|the project)\b").unwrap()
    })
}

fn question_cue() -> &'static Regex {
    QUESTION_CUE
        .get_or_init(|| Regex::new(r"(?i)\b(?:what did|how did|when did|why did)\b").unwrap())
}

/// True when the message carries a cue that past context would help answer:
/// an explicit recall phrase, an unresolved reference, or a question about
/// the past.
pub fn should_inject(message: &str) -> bool {
    recall_cue().is_match(message)
        || reference_cue().is_match(message)
        || question_cue().is_match(message)
}

/// Wraps the memory graph's context retrieval behind the cue check.
pub struct ContextInjector {
    graph: Arc<MemoryGraph>,
}

impl ContextInjector {
    pub fn new(graph: Arc<MemoryGraph>) -> Self {
        Self { graph }
    }

    /// Return the message with relevant context prepended, or unchanged when
    /// no cue fires or nothing relevant is stored.
    pub async fn inject(&self, message: &str, user_id: &str) -> Result<String> {
        if !should_inject(message) {
            debug!(user_id, "no injection cue in message");
            return Ok(message.to_string());
        }

        let context = self.graph.get_relevant_context(message, user_id).await?;
        if context.trim().is_empty() {
            return Ok(message.to_string());
        }

        Ok(format!("{context}\n\n---\n\nUser message: {message}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recall_phrases_trigger() {
        assert!(should_inject("Do you remember the deployment plan?"));
        assert!(should_inject("We talked about this earlier"));
        assert!(should_inject("As I said previously, ship it"));
    }

    #[test]
    fn test_references_trigger() {
        assert!(should_inject("Is it still running?"));
        assert!(should_inject("She approved the budget"));
        assert!(should_inject("How is the project going?"));
    }

    #[test]
    fn test_past_questions_trigger() {
        assert!(should_inject("What did the benchmark show?"));
        assert!(should_inject("What did we discuss about it?"));
        assert!(should_inject("Why did the build fail?"));
    }

    #[test]
    fn test_plain_statements_do_not_trigger() {
        assert!(!should_inject("Deploy to staging at noon"));
        assert!(!should_inject("The sky is blue"));
        assert!(!should_inject("Hello"));
        assert!(!should_inject(""));
    }

    #[test]
    fn test_cues_are_case_insensitive_and_word_bounded() {
        assert!(should_inject("REMEMBER the password policy"));
        // "item" contains "it" but not on a word boundary
        assert!(!should_inject("Add an item"));
    }
}
