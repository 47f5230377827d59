//! Quiplash 3: two regular prompts per round, the three-answer Thriplash,
//! and the safety-quip-free Last Lash (with its promptless comic variant).

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, info};

use jitb_chat_client::ChatClient;
use jitb_core_types::timing::POST_SUBMIT_DELAY;
use jitb_core_types::{Game, PageKind, Selector};
use jitb_dom_facade::Dom;
use jitb_page_classifier::{get_prompt, is_page, is_vote_page};

use crate::common::{
    answer_prompts, click_button, generate_answer_with_retry, generate_multi_with_retry,
    read_char_limit, select_avatar, vote_answers, CharLimit, PromptFields, DEFAULT_CHAR_LIMIT,
};
use crate::errors::GameError;
use crate::login::is_login_page;
use crate::GameController;

const QUESTION_TEXT_ID: &str = "question-text";
const ANSWER_INPUT_ID: &str = "quiplash-answer-input";
const SUBMIT_LABEL: &str = "SEND";
const SAFETY_QUIP_CLASS: &str = "safety-quip";
const THRIPLASH_INPUT_CLASS: &str = "thriplash-input";
const LAST_LASH_ID: &str = "lastlash-prompt";
const VOTE_PROMPT_ID: &str = "vote-prompt";
const AVATAR_STATE_ID: &str = "state-avatar-select";

const VOTE_BLACKLIST: &[&str] = &["Reset my choices"];

/// Character names the bot is willing to play as.
const AVATAR_NAMES: &[&str] = &[
    "Big Mouth", "Cactus", "Cool Dog", "Doughnut", "Egg", "Ghost", "Hot Sauce", "Pizza Slice",
    "Robot", "Tomato", "UFO", "Wizard",
];

/// The comic Last Lash shows only the round banner; feed the model a stand-in.
const COMIC_LASH_PROMPT: &str =
    "Write a short funny caption for a blank comic panel in which absolutely anything could \
     be happening";

const PERSONA: &str = "You are a hilarious contestant in the party game Quiplash. Answer \
                       prompts with short, absurd, punchy jokes. Never explain the joke.";

pub struct Quiplash3 {
    chat: Arc<dyn ChatClient>,
    screen_name: String,
    avatar_done: bool,
    last_kind: PageKind,
    last_prompt: Option<String>,
    last_vote: Option<String>,
}

impl Quiplash3 {
    pub fn new(chat: Arc<dyn ChatClient>, screen_name: impl Into<String>) -> Self {
        chat.set_persona(PERSONA);
        Self {
            chat,
            screen_name: screen_name.into(),
            avatar_done: false,
            last_kind: PageKind::Unknown,
            last_prompt: None,
            last_vote: None,
        }
    }

    fn prompt_fields() -> PromptFields {
        PromptFields {
            prompt: Selector::id(QUESTION_TEXT_ID),
            clues: &[],
            input: Selector::id(ANSWER_INPUT_ID),
            submit_label: SUBMIT_LABEL,
            limit: CharLimit::MaxLengthAttr,
            default_limit: DEFAULT_CHAR_LIMIT,
        }
    }

    /// Three input fields, three answers, one submit.
    pub async fn answer_thriplash(&mut self, dom: &dyn Dom) -> Result<(), GameError> {
        let prompt = match get_prompt(dom, &Selector::id(QUESTION_TEXT_ID), &[], true).await {
            Ok(prompt) => prompt,
            Err(err) if err.is_mismatch() => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        let inputs = dom
            .locate_all(&Selector::class(THRIPLASH_INPUT_CLASS))
            .await?;
        if inputs.len() < 3 {
            return Err(GameError::NothingSubmitted);
        }
        let limit = dom
            .attr_of(&inputs[0], "maxlength")
            .await?
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_CHAR_LIMIT);
        let answers =
            generate_multi_with_retry(self.chat.as_ref(), &prompt, 3, limit).await?;
        for (input, answer) in inputs.iter().zip(&answers) {
            if !dom.type_text(input, answer).await? {
                return Err(GameError::NothingSubmitted);
            }
        }
        if !click_button(dom, SUBMIT_LABEL).await? {
            return Err(GameError::NothingSubmitted);
        }
        info!(prompt = %prompt, "submitted thriplash");
        self.last_prompt = Some(prompt);
        sleep(POST_SUBMIT_DELAY).await;
        Ok(())
    }

    async fn answer_last_lash(&mut self, dom: &dyn Dom) -> Result<(), GameError> {
        let raw = match get_prompt(dom, &Selector::id(LAST_LASH_ID), &[], true).await {
            Ok(text) => text,
            Err(err) if err.is_mismatch() => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        let prompt = if is_comic_lash(&raw) {
            debug!("comic lash detected; using stand-in prompt");
            COMIC_LASH_PROMPT.to_string()
        } else {
            raw
        };
        let fields = Self::prompt_fields();
        let limit = read_char_limit(dom, &fields).await?;
        let answer = generate_answer_with_retry(self.chat.as_ref(), &prompt, limit).await?;
        let Some(input) = dom.locate(&fields.input).await? else {
            return Err(GameError::NothingSubmitted);
        };
        if !dom.type_text(&input, &answer).await? || !click_button(dom, SUBMIT_LABEL).await? {
            return Err(GameError::NothingSubmitted);
        }
        info!(answer = %answer, "submitted last lash");
        self.last_prompt = Some(prompt);
        sleep(POST_SUBMIT_DELAY).await;
        Ok(())
    }
}

#[async_trait]
impl GameController for Quiplash3 {
    fn game(&self) -> Game {
        Game::Quiplash3
    }

    async fn id_page(&self, dom: &dyn Dom) -> PageKind {
        if is_vote_page(dom, &Selector::id(VOTE_PROMPT_ID), true)
            .await
            .unwrap_or(false)
        {
            return PageKind::Vote;
        }
        if dom
            .locate_all(&Selector::class(THRIPLASH_INPUT_CLASS))
            .await
            .map(|inputs| inputs.len() >= 3)
            .unwrap_or(false)
        {
            return PageKind::ThriplashPrompt;
        }
        let last_lash_marker = matches!(
            dom.locate(&Selector::id(LAST_LASH_ID)).await,
            Ok(Some(_))
        );
        let safety_quip = matches!(
            dom.locate(&Selector::class(SAFETY_QUIP_CLASS)).await,
            Ok(Some(_))
        );
        if last_lash_marker && !safety_quip {
            return PageKind::LastLashPrompt;
        }
        if is_page(dom, &Selector::id(QUESTION_TEXT_ID), &[], false)
            .await
            .unwrap_or(false)
        {
            return PageKind::AnswerPrompt;
        }
        if matches!(dom.locate(&Selector::id(AVATAR_STATE_ID)).await, Ok(Some(_))) {
            return PageKind::AvatarSelect;
        }
        if is_login_page(dom).await.unwrap_or(false) {
            return PageKind::Login;
        }
        PageKind::Unknown
    }

    async fn play(&mut self, dom: &dyn Dom) -> Result<(), GameError> {
        let current = self.id_page(dom).await;
        let entered = current != self.last_kind;
        if entered {
            debug!(player = %self.screen_name, from = %self.last_kind, to = %current, "page change");
            match current {
                PageKind::AvatarSelect if !self.avatar_done => {
                    self.select_character(dom).await?;
                }
                PageKind::AnswerPrompt => {
                    self.last_prompt = None;
                    let chat = Arc::clone(&self.chat);
                    answer_prompts(
                        dom,
                        chat.as_ref(),
                        &Self::prompt_fields(),
                        2,
                        &mut self.last_prompt,
                    )
                    .await?;
                }
                PageKind::ThriplashPrompt => self.answer_thriplash(dom).await?,
                PageKind::LastLashPrompt => self.answer_last_lash(dom).await?,
                PageKind::Vote => {
                    self.last_vote = None;
                    let chat = Arc::clone(&self.chat);
                    vote_answers(
                        dom,
                        chat.as_ref(),
                        &Selector::id(VOTE_PROMPT_ID),
                        VOTE_BLACKLIST,
                        &mut self.last_vote,
                    )
                    .await?;
                }
                _ => {}
            }
        }
        self.last_kind = current;
        Ok(())
    }

    async fn select_character(&mut self, dom: &dyn Dom) -> Result<(), GameError> {
        select_avatar(dom, AVATAR_NAMES).await?;
        self.avatar_done = true;
        Ok(())
    }
}

/// Promptless comic variant: only the round banner made it into the prompt
/// element, so the trailing token is the round name itself.
fn is_comic_lash(text: &str) -> bool {
    text.split_whitespace()
        .last()
        .map(|token| token.eq_ignore_ascii_case("lash"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{login_page, mock_chat};
    use jitb_chat_client::MockChatClient;
    use jitb_dom_facade::{FixtureDom, FixtureElement, FixturePage};

    fn controller(chat: Arc<MockChatClient>) -> Quiplash3 {
        Quiplash3::new(chat, "BOTTY")
    }

    fn prompt_page() -> FixturePage {
        FixturePage::new(vec![
            FixtureElement::div(QUESTION_TEXT_ID, "Never take a first date to a ________"),
            FixtureElement::textarea(ANSWER_INPUT_ID).with_attr("maxlength", "45"),
            FixtureElement::button("SEND"),
            FixtureElement::button("SAFETY QUIP").with_class(SAFETY_QUIP_CLASS),
        ])
    }

    fn thriplash_page() -> FixturePage {
        FixturePage::new(vec![
            FixtureElement::div(QUESTION_TEXT_ID, "Three things you should never lick"),
            FixtureElement::textarea("t1")
                .with_class(THRIPLASH_INPUT_CLASS)
                .with_attr("maxlength", "30"),
            FixtureElement::textarea("t2").with_class(THRIPLASH_INPUT_CLASS),
            FixtureElement::textarea("t3").with_class(THRIPLASH_INPUT_CLASS),
            FixtureElement::button("SEND"),
        ])
    }

    fn vote_page() -> FixturePage {
        FixturePage::new(vec![
            FixtureElement::div(VOTE_PROMPT_ID, "Which one do you like more?"),
            FixtureElement::button("SCRAPPLE"),
            FixtureElement::button("BUTTE, MONTANA"),
            FixtureElement::button("Reset my choices"),
        ])
    }

    fn last_lash_page(text: &str) -> FixturePage {
        FixturePage::new(vec![
            FixtureElement::div(LAST_LASH_ID, text),
            FixtureElement::textarea(ANSWER_INPUT_ID).with_attr("maxlength", "45"),
            FixtureElement::button("SEND"),
        ])
    }

    #[tokio::test]
    async fn identifies_login() {
        let quip = controller(mock_chat());
        let dom = FixtureDom::single(login_page());
        assert_eq!(quip.id_page(&dom).await, PageKind::Login);
    }

    #[tokio::test]
    async fn identifies_prompt_vote_thriplash_lastlash() {
        let quip = controller(mock_chat());
        assert_eq!(
            quip.id_page(&FixtureDom::single(prompt_page())).await,
            PageKind::AnswerPrompt
        );
        assert_eq!(
            quip.id_page(&FixtureDom::single(vote_page())).await,
            PageKind::Vote
        );
        assert_eq!(
            quip.id_page(&FixtureDom::single(thriplash_page())).await,
            PageKind::ThriplashPrompt
        );
        assert_eq!(
            quip.id_page(&FixtureDom::single(last_lash_page("Write your final quip"))).await,
            PageKind::LastLashPrompt
        );
    }

    #[tokio::test]
    async fn unrelated_page_is_unknown() {
        let quip = controller(mock_chat());
        let dom = FixtureDom::single(FixturePage::new(vec![FixtureElement::div(
            "comic-archive",
            "Today's strip: a moose learns taxes",
        )]));
        assert_eq!(quip.id_page(&dom).await, PageKind::Unknown);
    }

    #[tokio::test]
    async fn safety_quip_keeps_regular_prompt_kind() {
        // Same marker id but a safety quip present: not the Last Lash.
        let quip = controller(mock_chat());
        let mut page = last_lash_page("A prompt");
        page.elements
            .push(FixtureElement::button("SAFETY QUIP").with_class(SAFETY_QUIP_CLASS));
        let dom = FixtureDom::single(page);
        assert_ne!(quip.id_page(&dom).await, PageKind::LastLashPrompt);
    }

    #[tokio::test(start_paused = true)]
    async fn thriplash_fills_three_fields_and_submits() {
        let chat = Arc::new(MockChatClient::scripted([
            "a cactus",
            "a subway pole",
            "the sun",
        ]));
        let mut quip = controller(Arc::clone(&chat));
        let dom = FixtureDom::single(thriplash_page());
        quip.answer_thriplash(&dom).await.unwrap();

        let typed = dom.typed();
        assert_eq!(typed.len(), 3);
        let answers: Vec<&str> = typed.iter().map(|(_, text)| text.as_str()).collect();
        assert_eq!(answers, vec!["a cactus", "a subway pole", "the sun"]);
        assert!(dom.clicks().contains(&"SEND".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn comic_lash_uses_stand_in_prompt() {
        let chat = Arc::new(MockChatClient::scripted(["moose tax returns"]));
        let mut quip = controller(Arc::clone(&chat));
        // Only the round banner present: trailing token heuristic fires.
        let dom = FixtureDom::single(last_lash_page("The Comic Lash"));
        quip.answer_last_lash(&dom).await.unwrap();
        let requests = chat.requests();
        assert!(requests[0].contains("comic panel"));
        assert_eq!(dom.typed()[0].1, "moose tax returns");
    }

    #[tokio::test(start_paused = true)]
    async fn vote_blacklist_excludes_reset() {
        let chat = Arc::new(MockChatClient::scripted(["SCRAPPLE"]));
        let mut quip = controller(Arc::clone(&chat));
        let dom = FixtureDom::new(vec![vote_page(), FixturePage::empty()]);
        dom.advance_on_click("SCRAPPLE");
        quip.play(&dom).await.unwrap();
        assert_eq!(dom.clicks(), vec!["SCRAPPLE".to_string()]);
        assert_eq!(quip.last_kind, PageKind::Vote);
    }

    #[tokio::test]
    async fn select_character_clicks_an_allowed_avatar() {
        let mut quip = controller(mock_chat());
        let dom = FixtureDom::single(FixturePage::new(vec![
            FixtureElement::new("div").with_id(AVATAR_STATE_ID),
            FixtureElement::button("Egg"),
            FixtureElement::button("Pizza Slice"),
            FixtureElement::button("NOT A CHARACTER"),
        ]));
        quip.select_character(&dom).await.unwrap();
        let clicks = dom.clicks();
        assert_eq!(clicks.len(), 1);
        assert!(clicks[0] == "Egg" || clicks[0] == "Pizza Slice");
        assert!(quip.avatar_done);
    }

    #[test]
    fn comic_heuristic() {
        assert!(is_comic_lash("The Comic Lash"));
        assert!(is_comic_lash("the last LASH"));
        assert!(!is_comic_lash("Write a caption for this"));
    }
}
