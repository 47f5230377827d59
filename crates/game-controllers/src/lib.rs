//! Game controllers: one state machine per supported game.
//!
//! A controller classifies the current screen into a [`PageKind`], fires the
//! action for that kind on the transition edge (or every tick for re-entrant
//! kinds), and otherwise stays quiet. All DOM access goes through the
//! facade; all text generation goes through the chat client.

use std::sync::Arc;

use async_trait::async_trait;

use jitb_chat_client::ChatClient;
use jitb_core_types::{Game, PageKind};
use jitb_dom_facade::Dom;

pub mod blather;
pub mod common;
pub mod errors;
pub mod jobjob;
pub mod jokeboat;
pub mod login;
pub mod quiplash;

#[cfg(test)]
pub(crate) mod testutil;

pub use blather::BlatherRound;
pub use errors::GameError;
pub use jobjob::JobJob;
pub use jokeboat::JokeBoat;
pub use quiplash::Quiplash3;

/// Common capability set shared by every game.
#[async_trait]
pub trait GameController: Send {
    fn game(&self) -> Game;

    /// Classify the current screen; the test order is game-specific and
    /// transient DOM trouble falls back to `Unknown`.
    async fn id_page(&self, dom: &dyn Dom) -> PageKind;

    /// One tick of the play loop.
    async fn play(&mut self, dom: &dyn Dom) -> Result<(), GameError>;

    /// Pick an avatar. Games without one keep the default.
    async fn select_character(&mut self, _dom: &dyn Dom) -> Result<(), GameError> {
        Err(GameError::Unsupported("character selection"))
    }
}

/// Construct the controller for `game`. Setting the persona happens in the
/// constructor, so build the chosen controller last when probing.
pub fn controller_for(
    game: Game,
    chat: Arc<dyn ChatClient>,
    screen_name: &str,
) -> Box<dyn GameController> {
    match game {
        Game::Quiplash3 => Box::new(Quiplash3::new(chat, screen_name)),
        Game::JokeBoat => Box::new(JokeBoat::new(chat, screen_name)),
        Game::BlatherRound => Box::new(BlatherRound::new(chat, screen_name)),
        Game::JobJob => Box::new(JobJob::new(chat, screen_name)),
    }
}
