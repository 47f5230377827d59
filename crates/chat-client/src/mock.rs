//! Deterministic chat client for tests and offline runs.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::ChatError;
use crate::polish::{polish_answer, DEFAULT_MIN_FITB_LEN};
use crate::{match_option, ChatClient, ChatMessage};

/// Scripted FIFO of replies with a recorded transcript of requests.
///
/// Replies run through the same polish pipeline as production answers so
/// controller tests observe real post-processing. An exhausted script falls
/// back to a fixed filler answer (or the first option for votes).
#[derive(Default)]
pub struct MockChatClient {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<String>>,
    personas: Mutex<Vec<String>>,
}

const FALLBACK_ANSWER: &str = "a perfectly reasonable answer";

impl MockChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mock = Self::new();
        for reply in replies {
            mock.push_reply(reply);
        }
        mock
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().push_back(reply.into());
    }

    /// User prompts seen so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn personas(&self) -> Vec<String> {
        self.personas.lock().clone()
    }

    fn next_reply(&self) -> Option<String> {
        self.replies.lock().pop_front()
    }

    fn record(&self, prompt: &str) {
        self.requests.lock().push(prompt.to_string());
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    fn set_persona(&self, persona: &str) {
        self.personas.lock().push(persona.to_string());
    }

    async fn generate_answer(
        &self,
        prompt: &str,
        length_limit: usize,
        min_fitb_len: usize,
    ) -> Result<String, ChatError> {
        self.record(prompt);
        let reply = self
            .next_reply()
            .unwrap_or_else(|| FALLBACK_ANSWER.to_string());
        polish_answer(prompt, &reply, length_limit, min_fitb_len)
    }

    async fn generate_multi(
        &self,
        prompt: &str,
        n: usize,
        length_limit: usize,
    ) -> Result<Vec<String>, ChatError> {
        self.record(prompt);
        let mut answers = Vec::with_capacity(n);
        for _ in 0..n {
            let reply = self
                .next_reply()
                .unwrap_or_else(|| FALLBACK_ANSWER.to_string());
            answers.push(polish_answer(
                prompt,
                &reply,
                length_limit,
                DEFAULT_MIN_FITB_LEN,
            )?);
        }
        Ok(answers)
    }

    async fn vote_favorite(
        &self,
        prompt: &str,
        options: &[String],
    ) -> Result<String, ChatError> {
        if options.is_empty() {
            return Err(ChatError::EmptyOptions);
        }
        self.record(prompt);
        match self.next_reply() {
            Some(reply) => {
                match_option(&reply, options).ok_or(ChatError::NoSuchOption { reply })
            }
            None => Ok(options[0].clone()),
        }
    }

    async fn raw_complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        if messages.is_empty() {
            return Err(ChatError::EmptyPrompt);
        }
        let joined = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.record(&joined);
        Ok(self
            .next_reply()
            .unwrap_or_else(|| FALLBACK_ANSWER.to_string()))
    }
}
