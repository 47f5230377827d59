//! Page-classification primitives.
//!
//! Two predicates and two extractors over the DOM facade: is this screen a
//! page of kind X (identified by textual clues inside a designated element),
//! and what is the prompt / vote text on it. Everything else in the bot is
//! built on these four calls.

pub mod classify;
pub mod errors;
pub mod normalize;

pub use classify::{get_prompt, get_vote_text, is_page, is_vote_page, VOTE_CLUES};
pub use errors::ClassifyError;
pub use normalize::{normalize, normalize_flat};
