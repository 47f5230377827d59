use thiserror::Error;

/// Failures surfaced by the DOM facade.
///
/// Lookup misses and stale handles never appear here; the facade folds them
/// into `None` / `false` returns so callers can re-poll.
#[derive(Debug, Error)]
pub enum DomError {
    /// Browser could not be started or configured.
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// Navigation failed outright (bad URL, browser gone).
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Script evaluation raised or returned garbage.
    #[error("script evaluation failed: {0}")]
    Script(String),

    /// A selector carried an empty value.
    #[error("empty selector value")]
    EmptySelector,

    /// CDP transport or protocol error not attributable to a missing node.
    #[error("CDP I/O error: {0}")]
    CdpIo(String),
}

impl DomError {
    /// Whether the outer loop may simply re-poll after this failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomError::CdpIo(_) | DomError::Script(_))
    }
}
