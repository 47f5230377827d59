//! Driver-level tests against the scripted DOM double: the join ceremony,
//! the host error checks, and controller choice.

use std::sync::Arc;

use jitb::session::HOST_URL;
use jitb::{SessionConfig, SessionDriver, SessionError};
use jitb_chat_client::{ChatClient, MockChatClient};
use jitb_core_types::Game;
use jitb_dom_facade::{FixtureDom, FixtureElement, FixturePage};

fn login_page() -> FixturePage {
    FixturePage::new(vec![
        FixtureElement::input("roomcode"),
        FixtureElement::input("username"),
        FixtureElement::new("button")
            .with_id("button-join")
            .with_text("PLAY"),
    ])
}

fn chat() -> Arc<dyn ChatClient> {
    Arc::new(MockChatClient::new())
}

fn config(game: Option<Game>) -> SessionConfig {
    SessionConfig {
        room: "abcd".to_string(),
        user: "BOTTY".to_string(),
        game,
    }
}

#[tokio::test(start_paused = true)]
async fn join_fills_the_form_and_presses_join() {
    let dom = FixtureDom::new(vec![login_page(), FixturePage::empty()]);
    dom.advance_on_click("PLAY");
    let driver = SessionDriver::new(&dom, chat(), config(None));

    driver.join().await.unwrap();

    assert_eq!(dom.visited(), vec![HOST_URL.to_string()]);
    let typed = dom.typed();
    assert!(typed.contains(&("roomcode".to_string(), "ABCD".to_string())));
    assert!(typed.contains(&("username".to_string(), "BOTTY".to_string())));
    assert_eq!(dom.clicks(), vec!["PLAY".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn room_not_found_fails_with_the_host_string() {
    let dom = FixtureDom::single(login_page());
    dom.set_source_extra("Room not found");
    let driver = SessionDriver::new(&dom, chat(), config(None));

    let err = driver.join().await.unwrap_err();
    assert_eq!(err.to_string(), "Room not found");
    assert!(matches!(err, SessionError::Host(_)));
}

#[tokio::test]
async fn disconnection_modal_is_reported_with_the_fixed_string() {
    let dom = FixtureDom::single(FixturePage::new(vec![FixtureElement::div(
        "swal2-title",
        "Disconnected",
    )]));
    let driver = SessionDriver::new(&dom, chat(), config(None));

    let err = driver.check_for_errors().await.unwrap_err();
    assert_eq!(err.to_string(), "The room was disconnected");
    assert!(matches!(err, SessionError::Disconnected));
}

#[tokio::test(start_paused = true)]
async fn missing_login_field_is_fatal() {
    let dom = FixtureDom::single(FixturePage::new(vec![FixtureElement::input("roomcode")]));
    let driver = SessionDriver::new(&dom, chat(), config(None));

    let err = driver.join().await.unwrap_err();
    assert!(matches!(err, SessionError::MissingLoginField("username")));
}

#[tokio::test]
async fn preconfigured_game_skips_detection() {
    let dom = FixtureDom::single(FixturePage::empty());
    let driver = SessionDriver::new(&dom, chat(), config(Some(Game::JobJob)));

    let controller = driver.pick_controller().await.unwrap();
    assert_eq!(controller.game(), Game::JobJob);
}

#[tokio::test(start_paused = true)]
async fn full_session_answers_until_disconnected() {
    let dom = FixtureDom::new(vec![
        login_page(),
        FixturePage::new(vec![
            FixtureElement::div("question-text", "Never take a first date to a ________"),
            FixtureElement::textarea("quiplash-answer-input").with_attr("maxlength", "45"),
            FixtureElement::button("SEND"),
        ]),
        FixturePage::new(vec![FixtureElement::div("swal2-title", "Disconnected")]),
    ]);
    dom.advance_on_click("PLAY");
    dom.advance_on_click("SEND");

    let chat = Arc::new(MockChatClient::scripted(["\"a funeral home.\""]));
    let driver = SessionDriver::new(&dom, chat, config(None));

    let err = driver.run().await.unwrap_err();
    assert_eq!(err.to_string(), "The room was disconnected");

    let typed = dom.typed();
    assert!(typed.contains(&(
        "quiplash-answer-input".to_string(),
        "funeral home".to_string()
    )));
    let clicks = dom.clicks();
    assert!(clicks.contains(&"PLAY".to_string()));
    assert!(clicks.contains(&"SEND".to_string()));
}

#[tokio::test(start_paused = true)]
async fn first_recognized_screen_latches_the_controller() {
    // A Quiplash answer screen: the probe round should latch Quiplash 3.
    let dom = FixtureDom::single(FixturePage::new(vec![
        FixtureElement::div("question-text", "Never take a first date to a ________"),
        FixtureElement::textarea("quiplash-answer-input"),
        FixtureElement::button("SEND"),
    ]));
    let driver = SessionDriver::new(&dom, chat(), config(None));

    let controller = driver.pick_controller().await.unwrap();
    assert_eq!(controller.game(), Game::Quiplash3);
}
