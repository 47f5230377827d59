use std::env;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{ChatConfig, CREDENTIAL_ENV};
use crate::errors::ChatError;
use crate::polish::polish_answer;
use crate::{match_option, ChatClient, ChatMessage};

/// OpenAI-compatible chat-completion client.
///
/// One instance lives for the whole process. The credential is read lazily
/// on the first request; its absence is fatal to the caller.
pub struct OpenAiChatClient {
    client: Client,
    config: ChatConfig,
    persona: Mutex<String>,
    api_key: OnceCell<String>,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiChatClient {
    pub fn new(config: ChatConfig) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ChatError::Transport(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            config,
            persona: Mutex::new(String::new()),
            api_key: OnceCell::new(),
        })
    }

    fn credential(&self) -> Result<&str, ChatError> {
        self.api_key
            .get_or_try_init(|| {
                env::var(CREDENTIAL_ENV).map_err(|_| ChatError::MissingCredential(CREDENTIAL_ENV))
            })
            .map(String::as_str)
    }

    fn conversation(&self, user: String) -> Vec<ChatMessage> {
        let persona = self.persona.lock().clone();
        let mut messages = Vec::with_capacity(2);
        if !persona.is_empty() {
            messages.push(ChatMessage::system(persona));
        }
        messages.push(ChatMessage::user(user));
        messages
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let key = self.credential()?;
        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let body = ChatCompletionRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages,
        };
        let response = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(|err| ChatError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            let body = body.chars().take(300).collect::<String>();
            warn!(status = status.as_u16(), body = %body, "chat service rejected request");
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| ChatError::BadResponse(err.to_string()))?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        debug!(chars = content.len(), "chat completion received");
        if content.trim().is_empty() {
            return Err(ChatError::BadResponse("empty completion".to_string()));
        }
        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    fn set_persona(&self, persona: &str) {
        *self.persona.lock() = persona.to_string();
    }

    async fn generate_answer(
        &self,
        prompt: &str,
        length_limit: usize,
        min_fitb_len: usize,
    ) -> Result<String, ChatError> {
        if length_limit == 0 || min_fitb_len == 0 {
            return Err(ChatError::InvalidLimit);
        }
        if prompt.trim().is_empty() {
            return Err(ChatError::EmptyPrompt);
        }
        let user = format!(
            "{prompt}\n\nReply with only your answer, {length_limit} characters or fewer."
        );
        let reply = self.complete(&self.conversation(user)).await?;
        let first_line = reply
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default();
        polish_answer(prompt, first_line, length_limit, min_fitb_len)
    }

    async fn generate_multi(
        &self,
        prompt: &str,
        n: usize,
        length_limit: usize,
    ) -> Result<Vec<String>, ChatError> {
        if n == 0 || length_limit == 0 {
            return Err(ChatError::InvalidLimit);
        }
        if prompt.trim().is_empty() {
            return Err(ChatError::EmptyPrompt);
        }
        let user = format!(
            "{prompt}\n\nGive {n} different answers, one per line, {length_limit} characters \
             each or fewer. No numbering, nothing else."
        );
        let reply = self.complete(&self.conversation(user)).await?;
        let mut answers = Vec::with_capacity(n);
        for line in reply.lines() {
            let line = strip_enumeration(line);
            if line.is_empty() {
                continue;
            }
            match polish_answer(prompt, line, length_limit, crate::DEFAULT_MIN_FITB_LEN) {
                Ok(answer) => answers.push(answer),
                Err(err) => debug!(error = %err, "dropping unusable answer line"),
            }
            if answers.len() == n {
                break;
            }
        }
        if answers.len() < n {
            return Err(ChatError::BadResponse(format!(
                "expected {n} answers, got {}",
                answers.len()
            )));
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
        if prompt.trim().is_empty() {
            return Err(ChatError::EmptyPrompt);
        }
        let mut user = format!("{prompt}\n\nOptions:\n");
        for option in options {
            user.push_str("- ");
            user.push_str(option);
            user.push('\n');
        }
        user.push_str("\nReply with exactly one option, verbatim.");
        let reply = self.complete(&self.conversation(user)).await?;
        match_option(&reply, options).ok_or(ChatError::NoSuchOption { reply })
    }

    async fn raw_complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        if messages.is_empty() {
            return Err(ChatError::EmptyPrompt);
        }
        self.complete(messages).await
    }
}

/// Drop "1. ", "2) ", "- ", "* " style prefixes from a multi-answer line.
pub fn strip_enumeration(line: &str) -> &str {
    let line = line.trim();
    let without_digits = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if without_digits.len() != line.len() {
        if let Some(rest) = without_digits
            .strip_prefix('.')
            .or_else(|| without_digits.strip_prefix(')'))
        {
            return rest.trim_start();
        }
    }
    line.strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .map(str::trim_start)
        .unwrap_or(line)
}
