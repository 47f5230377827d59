//! Chat-model client for the jitb player bot.
//!
//! Controllers talk to the model through the [`ChatClient`] trait; the
//! production implementation is [`OpenAiChatClient`], tests use
//! [`MockChatClient`]. Every call is a fresh two-message conversation
//! (system persona + one user message); no history is threaded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod config;
pub mod errors;
pub mod mock;
pub mod openai;
pub mod polish;

pub use config::{ChatConfig, API_BASE_ENV, CREDENTIAL_ENV, DEFAULT_API_BASE, DEFAULT_MODEL};
pub use errors::ChatError;
pub use mock::MockChatClient;
pub use openai::{strip_enumeration, OpenAiChatClient};
pub use polish::{polish_answer, DEFAULT_MIN_FITB_LEN};

use jitb_page_classifier::normalize_flat;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Stateless-looking adapter to a chat-completion service.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Replace the system persona used by subsequent calls.
    fn set_persona(&self, persona: &str);

    /// One polished answer of at most `length_limit` characters.
    async fn generate_answer(
        &self,
        prompt: &str,
        length_limit: usize,
        min_fitb_len: usize,
    ) -> Result<String, ChatError>;

    /// `n` polished answers, each at most `length_limit` characters.
    async fn generate_multi(
        &self,
        prompt: &str,
        n: usize,
        length_limit: usize,
    ) -> Result<Vec<String>, ChatError>;

    /// Pick a favorite; the return value is one of `options`, verbatim.
    async fn vote_favorite(
        &self,
        prompt: &str,
        options: &[String],
    ) -> Result<String, ChatError>;

    /// Raw completion for engineered prompts; no polishing.
    async fn raw_complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError>;
}

/// Map a model reply back to one of the offered options: exact first, then
/// case-insensitive, then by normalized containment either way.
pub(crate) fn match_option(reply: &str, options: &[String]) -> Option<String> {
    let reply = reply.trim().trim_matches(['"', '\'']).trim();
    if let Some(hit) = options.iter().find(|o| o.as_str() == reply) {
        return Some(hit.clone());
    }
    let folded = fold(reply);
    if let Some(hit) = options.iter().find(|o| fold(o) == folded) {
        return Some(hit.clone());
    }
    if folded.is_empty() {
        return None;
    }
    options
        .iter()
        .find(|o| {
            let option = fold(o);
            option.contains(&folded) || folded.contains(&option)
        })
        .cloned()
}

fn fold(text: &str) -> String {
    normalize_flat(text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_match_wins() {
        let opts = options(&["SCRAPPLE", "BUTTE, MONTANA"]);
        assert_eq!(
            match_option("SCRAPPLE", &opts).as_deref(),
            Some("SCRAPPLE")
        );
    }

    #[test]
    fn case_insensitive_and_quoted_replies_resolve() {
        let opts = options(&["SCRAPPLE", "BUTTE, MONTANA"]);
        assert_eq!(
            match_option("\"butte, montana\"", &opts).as_deref(),
            Some("BUTTE, MONTANA")
        );
    }

    #[test]
    fn containment_resolves_chatty_replies() {
        let opts = options(&["SCRAPPLE", "BUTTE, MONTANA"]);
        assert_eq!(
            match_option("scrapple!", &opts).as_deref(),
            Some("SCRAPPLE")
        );
        assert_eq!(
            match_option("Butte", &opts).as_deref(),
            Some("BUTTE, MONTANA")
        );
    }

    #[test]
    fn no_match_is_none() {
        let opts = options(&["SCRAPPLE"]);
        assert_eq!(match_option("pancakes", &opts), None);
    }
}
