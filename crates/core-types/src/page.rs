use std::fmt;

use serde::{Deserialize, Serialize};

/// Discrete classification of the current game screen.
///
/// The set is closed over all supported games; controllers only ever act on
/// the kinds they know. `Unknown` is the default/transitional state between
/// recognizable screens (lobbies, score reveals, the disconnection modal).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageKind {
    #[default]
    Unknown,
    Login,
    AvatarSelect,
    AnswerPrompt,
    Vote,
    ThriplashPrompt,
    LastLashPrompt,
    JokeTopic,
    Catchphrase,
    Perform,
    SecretPrompt,
    Describe,
    Blame,
    WaitForLikes,
}

impl PageKind {
    /// Kinds whose action fires again while the page stays put, not only on
    /// the edge into it.
    pub fn is_reentrant(self) -> bool {
        matches!(self, PageKind::Describe | PageKind::JokeTopic)
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageKind::Unknown => "unknown",
            PageKind::Login => "login",
            PageKind::AvatarSelect => "avatar-select",
            PageKind::AnswerPrompt => "answer-prompt",
            PageKind::Vote => "vote",
            PageKind::ThriplashPrompt => "thriplash-prompt",
            PageKind::LastLashPrompt => "last-lash-prompt",
            PageKind::JokeTopic => "joke-topic",
            PageKind::Catchphrase => "catchphrase",
            PageKind::Perform => "perform",
            PageKind::SecretPrompt => "secret-prompt",
            PageKind::Describe => "describe",
            PageKind::Blame => "blame",
            PageKind::WaitForLikes => "wait-for-likes",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unknown() {
        assert_eq!(PageKind::default(), PageKind::Unknown);
    }

    #[test]
    fn reentrant_kinds() {
        assert!(PageKind::Describe.is_reentrant());
        assert!(PageKind::JokeTopic.is_reentrant());
        assert!(!PageKind::AnswerPrompt.is_reentrant());
        assert!(!PageKind::Vote.is_reentrant());
    }
}
