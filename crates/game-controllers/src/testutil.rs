//! Shared fixtures for controller tests.

use std::sync::Arc;

use jitb_chat_client::MockChatClient;
use jitb_dom_facade::{FixtureElement, FixturePage};

use crate::login::{JOIN_BUTTON_ID, ROOM_CODE_ID, USERNAME_ID};

pub(crate) fn mock_chat() -> Arc<MockChatClient> {
    Arc::new(MockChatClient::new())
}

pub(crate) fn login_page() -> FixturePage {
    FixturePage::new(vec![
        FixtureElement::input(ROOM_CODE_ID),
        FixtureElement::input(USERNAME_ID),
        FixtureElement::new("button")
            .with_id(JOIN_BUTTON_ID)
            .with_text("PLAY"),
    ])
}
