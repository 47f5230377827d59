use thiserror::Error;

use jitb_dom_facade::DomError;

/// Failures from the classification primitives.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The element exists but its text does not satisfy the prompt clues.
    #[error("this is not a prompt page")]
    NotPromptPage,

    /// The element exists but its text does not satisfy the vote clues.
    #[error("this is not a vote page")]
    NotVotePage,

    /// The designated element could not be located at all.
    #[error("unable to locate element: {0}")]
    ElementMissing(String),

    /// The element was located but carries no text.
    #[error("element text is empty")]
    EmptyText,

    /// A caller passed an empty clue string; clues must be non-empty.
    #[error("page clue must be non-empty")]
    EmptyClue,

    #[error(transparent)]
    Dom(#[from] DomError),
}

impl ClassifyError {
    /// Mismatches are expected during transitions; the play loop re-polls.
    pub fn is_mismatch(&self) -> bool {
        matches!(
            self,
            ClassifyError::NotPromptPage
                | ClassifyError::NotVotePage
                | ClassifyError::ElementMissing(_)
                | ClassifyError::EmptyText
        )
    }
}
