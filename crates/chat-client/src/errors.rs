use thiserror::Error;

/// Failures from the chat-model client.
#[derive(Debug, Error)]
pub enum ChatError {
    /// A caller handed over an empty prompt.
    #[error("chat prompt is empty")]
    EmptyPrompt,

    /// The polished answer came out empty.
    #[error("chat answer was empty after polishing")]
    EmptyAnswer,

    /// Length limit or min fill-in-the-blank length was zero.
    #[error("length limit and min fill-in-the-blank length must be positive")]
    InvalidLimit,

    /// `vote_favorite` was called with no options.
    #[error("vote options must be non-empty")]
    EmptyOptions,

    /// The model's pick matched none of the offered options.
    #[error("model reply {reply:?} matches none of the options")]
    NoSuchOption { reply: String },

    /// The credential environment variable is unset.
    #[error("missing credential: set {0}")]
    MissingCredential(&'static str),

    /// Request never produced a response (connect, timeout, TLS).
    #[error("chat transport failure: {0}")]
    Transport(String),

    /// Non-2xx from the chat service.
    #[error("chat service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// 2xx but the payload was not the expected shape.
    #[error("malformed chat response: {0}")]
    BadResponse(String),
}

impl ChatError {
    /// Errors worth another attempt within the controller's retry budget.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChatError::Transport(_) => true,
            ChatError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
