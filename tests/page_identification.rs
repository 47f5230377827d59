//! Universal controller invariants: every controller agrees on the login
//! screen, votes are votes, and unrelated pages stay unknown.

use std::sync::Arc;

use jitb_chat_client::{ChatClient, MockChatClient};
use jitb_core_types::{Game, PageKind, Selector};
use jitb_dom_facade::{FixtureDom, FixtureElement, FixturePage};
use jitb_game_controllers::controller_for;
use jitb_page_classifier::get_prompt;

fn chat() -> Arc<dyn ChatClient> {
    Arc::new(MockChatClient::new())
}

fn login_page() -> FixturePage {
    FixturePage::new(vec![
        FixtureElement::input("roomcode"),
        FixtureElement::input("username"),
        FixtureElement::new("button")
            .with_id("button-join")
            .with_text("PLAY"),
    ])
}

fn vote_page() -> FixturePage {
    FixturePage::new(vec![
        FixtureElement::div("vote-prompt", "Vote for your favorite"),
        FixtureElement::button("FIRST ANSWER"),
        FixtureElement::button("SECOND ANSWER"),
    ])
}

/// An unrelated web page: nothing the host would render.
fn comic_page() -> FixturePage {
    FixturePage::new(vec![
        FixtureElement::div("comic-archive", "Today's strip: a moose learns taxes"),
        FixtureElement::new("button").with_text("Next strip"),
    ])
}

#[tokio::test]
async fn every_controller_recognizes_the_login_screen() {
    let dom = FixtureDom::single(login_page());
    for game in Game::ALL {
        let controller = controller_for(game, chat(), "BOTTY");
        assert_eq!(
            controller.id_page(&dom).await,
            PageKind::Login,
            "{game} failed the login fixture"
        );
    }
}

#[tokio::test]
async fn voting_games_recognize_the_vote_screen() {
    let dom = FixtureDom::single(vote_page());
    for game in [Game::Quiplash3, Game::JokeBoat, Game::JobJob] {
        let controller = controller_for(game, chat(), "BOTTY");
        assert_eq!(
            controller.id_page(&dom).await,
            PageKind::Vote,
            "{game} failed the vote fixture"
        );
    }
    // Blather has no vote round; its classifier must not invent one.
    let blather = controller_for(Game::BlatherRound, chat(), "BOTTY");
    assert_eq!(blather.id_page(&dom).await, PageKind::Unknown);
}

#[tokio::test]
async fn non_host_pages_stay_unknown_everywhere() {
    let dom = FixtureDom::single(comic_page());
    for game in Game::ALL {
        let controller = controller_for(game, chat(), "BOTTY");
        assert_eq!(
            controller.id_page(&dom).await,
            PageKind::Unknown,
            "{game} misread an unrelated page"
        );
    }
    let err = get_prompt(&dom, &Selector::id("question-text"), &[], false)
        .await
        .unwrap_err();
    assert!(err.is_mismatch());
}
