use std::env;
use std::time::Duration;

/// Environment variable holding the chat-service credential.
pub const CREDENTIAL_ENV: &str = "OPENAI_API_KEY";

/// Optional override for the API base URL (tests, proxies).
pub const API_BASE_ENV: &str = "JITB_OPENAI_API_BASE";

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Clone, Debug)]
pub struct ChatConfig {
    pub model: String,
    pub api_base: String,
    /// Fixed at 0.0: the bot wants the model's single best guess.
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: env::var(API_BASE_ENV).unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            temperature: 0.0,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ChatConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}
