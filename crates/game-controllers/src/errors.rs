use thiserror::Error;

use jitb_chat_client::ChatError;
use jitb_dom_facade::DomError;
use jitb_page_classifier::ClassifyError;

/// Failures surfaced by a game controller's tick.
#[derive(Debug, Error)]
pub enum GameError {
    /// The game has no such step (e.g. character selection).
    #[error("{0} is not supported by this game")]
    Unsupported(&'static str),

    /// The answer loop exhausted its attempts without a single submit.
    #[error("no answer was submitted after all attempts")]
    NothingSubmitted,

    /// Character selection could not click any allowed avatar.
    #[error("character selection failed after {0} attempts")]
    AvatarFailed(u32),

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Chat(#[from] ChatError),
}

impl GameError {
    /// Whether the session loop may swallow this and re-poll.
    ///
    /// Page-recognition mismatches and DOM timing races are the normal
    /// texture of a transitioning screen; missing credentials and protocol
    /// breakage are not.
    pub fn is_transient(&self) -> bool {
        match self {
            GameError::NothingSubmitted => true,
            GameError::Unsupported(_) | GameError::AvatarFailed(_) => false,
            GameError::Dom(err) => err.is_transient(),
            GameError::Classify(err) => err.is_mismatch(),
            // Model misbehavior ends the current page's action, not the
            // session; only credential and caller errors are fatal.
            GameError::Chat(err) => !matches!(
                err,
                ChatError::MissingCredential(_)
                    | ChatError::InvalidLimit
                    | ChatError::EmptyPrompt
                    | ChatError::EmptyOptions
            ),
        }
    }
}
