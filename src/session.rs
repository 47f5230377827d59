//! The session driver: join ceremony, controller choice, and the single
//! cooperative play loop.

use std::sync::Arc;

use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use jitb_chat_client::ChatClient;
use jitb_core_types::timing::{JOIN_FIELD_WAIT, POLL_INTERVAL};
use jitb_core_types::{Game, PageKind, Selector};
use jitb_dom_facade::{Dom, DomError, ElementRef};
use jitb_game_controllers::{controller_for, GameController, GameError};
use jitb_game_controllers::login::{JOIN_BUTTON_ID, ROOM_CODE_ID, USERNAME_ID};

/// The only host this bot plays on.
pub const HOST_URL: &str = "https://jackbox.tv/";

/// The host raises its disconnection modal under this id.
pub const DISCONNECT_MODAL_ID: &str = "swal2-title";

/// Error strings the host bakes into the page source.
pub const HOST_ERROR_STRINGS: &[&str] = &[
    "Room not found",
    "The room is full",
    "You have been removed from the room",
];

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("The room was disconnected")]
    Disconnected,

    /// Reported with the host's own error string.
    #[error("{0}")]
    Host(String),

    #[error("login page did not load: missing #{0}")]
    MissingLoginField(&'static str),

    #[error("could not interact with the join form")]
    JoinFailed,

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Game(#[from] GameError),
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub room: String,
    pub user: String,
    /// Pre-selected game; `None` auto-detects from the first non-login
    /// screen.
    pub game: Option<Game>,
}

pub struct SessionDriver<'a> {
    dom: &'a dyn Dom,
    chat: Arc<dyn ChatClient>,
    config: SessionConfig,
}

impl<'a> SessionDriver<'a> {
    pub fn new(dom: &'a dyn Dom, chat: Arc<dyn ChatClient>, config: SessionConfig) -> Self {
        Self { dom, chat, config }
    }

    /// Join the room, latch a controller, and play until the session ends.
    pub async fn run(&self) -> Result<(), SessionError> {
        self.join().await?;
        let mut controller = self.pick_controller().await?;
        info!(game = %controller.game(), "controller latched");
        loop {
            if let Err(err) = controller.play(self.dom).await {
                if err.is_transient() {
                    debug!(error = %err, "transient tick failure; re-polling");
                } else {
                    return Err(err.into());
                }
            }
            self.check_for_errors().await?;
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Open the host, fill the join form, press Join, and verify the host
    /// did not immediately reject us.
    pub async fn join(&self) -> Result<(), SessionError> {
        self.dom.goto(HOST_URL).await?;

        let room_field = self.locate_with_wait(ROOM_CODE_ID).await?;
        let user_field = self.locate_with_wait(USERNAME_ID).await?;
        let join_button = self.locate_with_wait(JOIN_BUTTON_ID).await?;

        let room_code = self.config.room.to_uppercase();
        if !self.dom.type_text(&room_field, &room_code).await?
            || !self.dom.type_text(&user_field, &self.config.user).await?
            || !self.dom.click(&join_button).await?
        {
            return Err(SessionError::JoinFailed);
        }
        info!(room = %room_code, user = %self.config.user, "join submitted");

        // Give the host a beat to either accept us or raise its banner.
        sleep(POLL_INTERVAL).await;
        self.check_for_errors().await?;
        Ok(())
    }

    /// Fail with the host's own words when a banner or the disconnection
    /// modal is up.
    pub async fn check_for_errors(&self) -> Result<(), SessionError> {
        if let Some(title) = self
            .dom
            .text_at(&Selector::id(DISCONNECT_MODAL_ID))
            .await?
        {
            debug!(modal = %title, "host modal present");
            if title.to_lowercase().contains("disconnect") {
                return Err(SessionError::Disconnected);
            }
        }
        let source = self.dom.page_source().await?;
        for error in HOST_ERROR_STRINGS {
            if source.contains(error) {
                return Err(SessionError::Host((*error).to_string()));
            }
        }
        Ok(())
    }

    /// Latch the controller: pre-configured, or the first whose `id_page`
    /// recognizes the screen once the game starts.
    pub async fn pick_controller(&self) -> Result<Box<dyn GameController>, SessionError> {
        if let Some(game) = self.config.game {
            return Ok(controller_for(game, Arc::clone(&self.chat), &self.config.user));
        }
        info!("waiting for the first game screen to auto-detect the game");
        loop {
            for game in Game::ALL {
                let probe = controller_for(game, Arc::clone(&self.chat), &self.config.user);
                let kind = probe.id_page(self.dom).await;
                if !matches!(kind, PageKind::Unknown | PageKind::Login) {
                    info!(game = %game, page = %kind, "game detected");
                    // Construct the winner last so its persona is the one
                    // left on the shared chat client.
                    return Ok(controller_for(game, Arc::clone(&self.chat), &self.config.user));
                }
            }
            self.check_for_errors().await?;
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn locate_with_wait(&self, id: &'static str) -> Result<ElementRef, SessionError> {
        let selector = Selector::id(id);
        let attempts = (JOIN_FIELD_WAIT.as_millis() / POLL_INTERVAL.as_millis()).max(1) as u32;
        for _ in 0..attempts {
            if let Some(element) = self.dom.locate(&selector).await? {
                return Ok(element);
            }
            sleep(POLL_INTERVAL).await;
        }
        warn!(field = id, "login field never appeared");
        Err(SessionError::MissingLoginField(id))
    }
}
