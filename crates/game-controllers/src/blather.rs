//! Blather Round: choose a secret prompt, describe it from word palettes,
//! and guess what the others are describing.
//!
//! The describe page is re-entrant (the palette refreshes while the page
//! stays), and the guess page acts on every tick, learning from its own
//! wrong guesses until the round resolves.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use jitb_chat_client::{ChatClient, ChatMessage};
use jitb_core_types::timing::{GUESS_UNKNOWN_RUN, VOTE_IDLE_SLEEP};
use jitb_core_types::{Game, PageKind, Selector};
use jitb_dom_facade::{enabled_buttons, sanitize_label, Dom};
use jitb_page_classifier::{get_prompt, is_page, normalize, normalize_flat};

use crate::common::{
    click_button, generate_answer_with_retry, raw_complete_with_retry, vote_favorite_with_retry,
};
use crate::errors::GameError;
use crate::login::is_login_page;
use crate::GameController;

const SENTENCE_ID: &str = "blather-sentence";
const WORD_LIST_ONE_ID: &str = "word-list-one";
const WORD_LIST_TWO_ID: &str = "word-list-two";
const CURRENT_DESCRIPTION_ID: &str = "current-description";
const DESCRIPTION_LIST_ID: &str = "description-list";
const GUESS_QUESTION_ID: &str = "guess-question";
const GUESS_INPUT_ID: &str = "guess-input";
const CHOOSE_ID: &str = "blather-choose";

const SUBMIT_LABEL: &str = "Submit";
const SKIP_LABEL: &str = "Skip";
const GUESS_LABEL: &str = "GUESS";
const NEW_PROMPTS_LABEL: &str = "Get new prompts";

const CHOOSE_CLUES: &[&str] = &["choose", "secret prompt"];
const GUESS_CLUES: &[&str] = &["describing"];

/// Raw blank marker in the guide sentence and its canonical replacement.
const BLANK_TOKEN: &str = "(BLANK)";
const BLANK_RUN: &str = "____";

const PRESENTING_MARKER: &str = "is presenting a:";
const GUESS_CHAR_LIMIT: usize = 40;

const PERSONA: &str = "You are playing the cooperative word game Blather Round. Follow \
                       instructions exactly and keep answers terse.";

pub struct BlatherRound {
    chat: Arc<dyn ChatClient>,
    screen_name: String,
    last_kind: PageKind,
    /// Sentences already described this round; cleared on entering and
    /// leaving the describe page.
    descriptions: Vec<String>,
    wrong_guesses: Vec<String>,
    last_guess: Option<String>,
    unknown_run: u32,
}

impl BlatherRound {
    pub fn new(chat: Arc<dyn ChatClient>, screen_name: impl Into<String>) -> Self {
        chat.set_persona(PERSONA);
        Self {
            chat,
            screen_name: screen_name.into(),
            last_kind: PageKind::Unknown,
            descriptions: Vec::new(),
            wrong_guesses: Vec::new(),
            last_guess: None,
            unknown_run: 0,
        }
    }

    async fn play_describe(&mut self, dom: &dyn Dom, entered: bool) -> Result<(), GameError> {
        if entered {
            self.descriptions.clear();
        }
        let Some(raw_sentence) = dom.text_at(&Selector::id(SENTENCE_ID)).await? else {
            return Ok(());
        };
        let sentence = normalize_flat(&raw_sentence).replace(BLANK_TOKEN, BLANK_RUN);
        let list_one = self.read_word_list(dom, WORD_LIST_ONE_ID).await?;
        let list_two = self.read_word_list(dom, WORD_LIST_TWO_ID).await?;
        if list_one.is_empty() {
            return Ok(());
        }

        let prompt = build_describe_prompt(&sentence, &list_one, &list_two, &self.descriptions);
        let reply = raw_complete_with_retry(
            self.chat.as_ref(),
            &[ChatMessage::system(PERSONA), ChatMessage::user(prompt)],
        )
        .await?;
        let words = parse_describe_reply(&reply);

        let mut all_clicked = !words.is_empty();
        for word in &words {
            if !self.click_word(dom, word).await? {
                warn!(word = %word, "could not click described word");
                all_clicked = false;
            }
        }
        if all_clicked {
            if let Some(described) = dom.text_at(&Selector::id(CURRENT_DESCRIPTION_ID)).await? {
                let described = normalize_flat(&described).trim().to_string();
                if !described.is_empty() {
                    self.descriptions.push(described);
                }
            }
            click_button(dom, SUBMIT_LABEL).await?;
        } else {
            click_button(dom, SKIP_LABEL).await?;
        }
        sleep(VOTE_IDLE_SLEEP).await;
        Ok(())
    }

    async fn play_guess(&mut self, dom: &dyn Dom, entered: bool) -> Result<(), GameError> {
        if entered {
            self.wrong_guesses.clear();
            self.last_guess = None;
        } else if let Some(previous) = self.last_guess.take() {
            // Still on the guess page: the last attempt did not land.
            self.wrong_guesses.push(previous);
        }

        let question =
            match get_prompt(dom, &Selector::id(GUESS_QUESTION_ID), GUESS_CLUES, true).await {
                Ok(question) => question,
                Err(err) if err.is_mismatch() => return Ok(()),
                Err(err) => return Err(err.into()),
            };
        let context = dom
            .text_at(&Selector::id(DESCRIPTION_LIST_ID))
            .await?
            .map(|text| normalize(&text))
            .unwrap_or_default();
        let (category, tail) = presenting_tail(&context);

        let mut prompt = format!("{question}\n{}\n", category_hint(category.as_deref()));
        if !tail.is_empty() {
            prompt.push_str("Recent description:\n");
            prompt.push_str(&tail);
            prompt.push('\n');
        }
        if !self.wrong_guesses.is_empty() {
            prompt.push_str(&format!(
                "These guesses were wrong, do not repeat them: {}.\n",
                self.wrong_guesses.join(", ")
            ));
        }
        prompt.push_str("Answer in one or two words without adding adjectives or adverbs.");

        let answer =
            generate_answer_with_retry(self.chat.as_ref(), &prompt, GUESS_CHAR_LIMIT).await?;
        let Some(input) = dom.locate(&Selector::id(GUESS_INPUT_ID)).await? else {
            return Ok(());
        };
        if !dom.type_text(&input, &answer).await? {
            // Frozen input: the round is showing the answer.
            debug!("guess input not interactable; round over");
            self.wrong_guesses.clear();
            self.last_guess = None;
            return Ok(());
        }
        click_button(dom, GUESS_LABEL).await?;
        info!(guess = %answer, "guess submitted");
        self.last_guess = Some(answer);
        sleep(VOTE_IDLE_SLEEP).await;
        Ok(())
    }

    async fn choose_secret_prompt(&mut self, dom: &dyn Dom) -> Result<(), GameError> {
        let header = dom
            .text_at(&Selector::id(CHOOSE_ID))
            .await?
            .unwrap_or_default();
        let inventory = enabled_buttons(dom, None, &[NEW_PROMPTS_LABEL]).await?;
        if inventory.is_empty() {
            return Ok(());
        }
        let options: Vec<String> = inventory.iter().map(|b| b.label.clone()).collect();
        let prompt = format!("{header}\nPick the prompt you could describe best.");
        let favorite =
            match vote_favorite_with_retry(self.chat.as_ref(), &prompt, &options).await {
                Ok(favorite) => favorite,
                Err(err) => {
                    warn!(error = %err, "secret prompt pick failed; taking the first");
                    options[0].clone()
                }
            };
        let wanted = sanitize_label(&favorite);
        if let Some(button) = inventory.iter().find(|b| b.sanitized == wanted) {
            dom.click(&button.element).await?;
            info!(secret_prompt = %favorite, "secret prompt chosen");
        }
        Ok(())
    }

    async fn read_word_list(&self, dom: &dyn Dom, id: &str) -> Result<Vec<String>, GameError> {
        let Some(root) = dom.locate(&Selector::id(id)).await? else {
            return Ok(Vec::new());
        };
        let mut words = Vec::new();
        for button in dom.buttons(Some(&root)).await? {
            if let Some(text) = dom.text_of(&button).await? {
                let text = text.trim().to_string();
                if !text.is_empty() {
                    words.push(text);
                }
            }
        }
        Ok(words)
    }

    async fn click_word(&self, dom: &dyn Dom, word: &str) -> Result<bool, GameError> {
        let wanted = sanitize_label(word);
        for list_id in [WORD_LIST_ONE_ID, WORD_LIST_TWO_ID] {
            let Some(root) = dom.locate(&Selector::id(list_id)).await? else {
                continue;
            };
            for button in dom.buttons(Some(&root)).await? {
                if let Some(text) = dom.text_of(&button).await? {
                    if sanitize_label(&text) == wanted {
                        return Ok(dom.click(&button).await?);
                    }
                }
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl GameController for BlatherRound {
    fn game(&self) -> Game {
        Game::BlatherRound
    }

    async fn id_page(&self, dom: &dyn Dom) -> PageKind {
        let sentence = matches!(dom.locate(&Selector::id(SENTENCE_ID)).await, Ok(Some(_)));
        let palette = matches!(
            dom.locate(&Selector::id(WORD_LIST_ONE_ID)).await,
            Ok(Some(_))
        );
        if sentence && palette {
            return PageKind::Describe;
        }
        if is_page(dom, &Selector::id(GUESS_QUESTION_ID), GUESS_CLUES, true)
            .await
            .unwrap_or(false)
        {
            return PageKind::AnswerPrompt;
        }
        if is_page(dom, &Selector::id(CHOOSE_ID), CHOOSE_CLUES, true)
            .await
            .unwrap_or(false)
        {
            return PageKind::SecretPrompt;
        }
        if is_login_page(dom).await.unwrap_or(false) {
            return PageKind::Login;
        }
        PageKind::Unknown
    }

    async fn play(&mut self, dom: &dyn Dom) -> Result<(), GameError> {
        let current = self.id_page(dom).await;
        let entered = current != self.last_kind;
        // The guess page acts every tick, like the describe loop.
        let reentrant = matches!(current, PageKind::Describe | PageKind::AnswerPrompt);
        if entered || reentrant {
            if entered {
                debug!(player = %self.screen_name, from = %self.last_kind, to = %current, "page change");
            }
            match current {
                PageKind::Describe => self.play_describe(dom, entered).await?,
                PageKind::AnswerPrompt => self.play_guess(dom, entered).await?,
                PageKind::SecretPrompt => self.choose_secret_prompt(dom).await?,
                _ => {}
            }
        }
        if self.last_kind == PageKind::Describe && current != PageKind::Describe {
            self.descriptions.clear();
        }
        if current == PageKind::Unknown {
            self.unknown_run += 1;
            if self.unknown_run >= GUESS_UNKNOWN_RUN {
                // The host is showing the answer; the guessing round is over.
                self.wrong_guesses.clear();
                self.last_guess = None;
            }
        } else {
            self.unknown_run = 0;
        }
        self.last_kind = current;
        Ok(())
    }
}

/// The exact answer-shape strings here are a parser contract: replies are
/// split on the comma and quote-stripped.
fn build_describe_prompt(
    sentence: &str,
    list_one: &[String],
    list_two: &[String],
    descriptions: &[String],
) -> String {
    let mut prompt = if list_two.is_empty() {
        format!(
            "Fill in the blank of this sentence: \"{sentence}\"\nWord list: {}\n",
            list_one.join(", ")
        )
    } else {
        format!(
            "Fill in the blanks of this sentence: \"{sentence}\"\nFirst list: {}\nSecond list: {}\n",
            list_one.join(", "),
            list_two.join(", ")
        )
    };
    if !descriptions.is_empty() {
        prompt.push_str(&format!(
            "You have already described it as: {}.\n",
            descriptions.join("; ")
        ));
    }
    if list_two.is_empty() {
        prompt.push_str(
            "Respond only as \"word_from_list\" using the exact word from the list.",
        );
    } else {
        prompt.push_str(
            "Respond only as \"word_from_first_list, word_from_second_list\" using the exact \
             words from the lists.",
        );
    }
    prompt
}

fn parse_describe_reply(reply: &str) -> Vec<String> {
    reply
        .lines()
        .next()
        .unwrap_or_default()
        .split(',')
        .map(|word| word.trim().trim_matches(['"', '\'']).trim().to_string())
        .filter(|word| !word.is_empty())
        .collect()
}

/// Keep only the lines from the most recent "is presenting a: ⟨category⟩"
/// marker on, returning the category alongside.
fn presenting_tail(context: &str) -> (Option<String>, String) {
    let lines: Vec<&str> = context.lines().collect();
    for (index, line) in lines.iter().enumerate().rev() {
        let lowered = line.to_lowercase();
        if let Some(at) = lowered.find(PRESENTING_MARKER) {
            let category = line[at + PRESENTING_MARKER.len()..].trim().to_string();
            let tail = lines[index..].join("\n");
            return ((!category.is_empty()).then_some(category), tail);
        }
    }
    (None, context.trim().to_string())
}

fn category_hint(category: Option<&str>) -> &'static str {
    let Some(category) = category else {
        return "They are describing something well-known.";
    };
    let lowered = category.to_lowercase();
    if lowered.contains("story") {
        "They are describing the title of a well-known story, such as a movie, book, or fairy tale."
    } else if lowered.contains("person") {
        "They are describing a famous person, real or fictional."
    } else if lowered.contains("place") {
        "They are describing a well-known place."
    } else if lowered.contains("thing") {
        "They are describing an everyday thing or object."
    } else {
        "They are describing something well-known."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{login_page, mock_chat};
    use jitb_chat_client::MockChatClient;
    use jitb_dom_facade::{FixtureDom, FixtureElement, FixturePage};

    fn controller(chat: Arc<MockChatClient>) -> BlatherRound {
        BlatherRound::new(chat, "BOTTY")
    }

    fn describe_page(two_lists: bool) -> FixturePage {
        let mut elements = vec![
            FixtureElement::div(SENTENCE_ID, "It is a (BLANK) story about (BLANK)"),
            FixtureElement::new("div").with_id(WORD_LIST_ONE_ID),
            FixtureElement::button("spooky").with_parent(WORD_LIST_ONE_ID),
            FixtureElement::button("happy").with_parent(WORD_LIST_ONE_ID),
        ];
        if two_lists {
            elements.push(FixtureElement::new("div").with_id(WORD_LIST_TWO_ID));
            elements.push(FixtureElement::button("pirates").with_parent(WORD_LIST_TWO_ID));
            elements.push(FixtureElement::button("taxes").with_parent(WORD_LIST_TWO_ID));
        }
        elements.push(FixtureElement::div(
            CURRENT_DESCRIPTION_ID,
            "It is a spooky story about pirates",
        ));
        elements.push(FixtureElement::button(SUBMIT_LABEL));
        elements.push(FixtureElement::button(SKIP_LABEL));
        FixturePage::new(elements)
    }

    fn guess_page() -> FixturePage {
        FixturePage::new(vec![
            FixtureElement::div(GUESS_QUESTION_ID, "What story is Alice describing?"),
            FixtureElement::div(
                DESCRIPTION_LIST_ID,
                "Alice joined\nAlice is presenting a: story\nIt is a spooky tale",
            ),
            FixtureElement::input(GUESS_INPUT_ID),
            FixtureElement::button(GUESS_LABEL),
        ])
    }

    #[tokio::test]
    async fn identifies_pages() {
        let blather = controller(mock_chat());
        assert_eq!(
            blather.id_page(&FixtureDom::single(login_page())).await,
            PageKind::Login
        );
        assert_eq!(
            blather.id_page(&FixtureDom::single(describe_page(true))).await,
            PageKind::Describe
        );
        assert_eq!(
            blather.id_page(&FixtureDom::single(guess_page())).await,
            PageKind::AnswerPrompt
        );
        let choose = FixtureDom::single(FixturePage::new(vec![
            FixtureElement::div(CHOOSE_ID, "Choose your secret prompt"),
            FixtureElement::button("DRACULA"),
            FixtureElement::button("Get new prompts"),
        ]));
        assert_eq!(blather.id_page(&choose).await, PageKind::SecretPrompt);
        assert_eq!(
            blather
                .id_page(&FixtureDom::single(FixturePage::empty()))
                .await,
            PageKind::Unknown
        );
    }

    #[tokio::test]
    async fn select_character_is_unsupported() {
        let mut blather = controller(mock_chat());
        let dom = FixtureDom::single(FixturePage::empty());
        assert!(matches!(
            blather.select_character(&dom).await.unwrap_err(),
            GameError::Unsupported(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn describe_clicks_words_and_submits() {
        let chat = Arc::new(MockChatClient::scripted(["\"spooky\", \"pirates\""]));
        let mut blather = controller(Arc::clone(&chat));
        let dom = FixtureDom::single(describe_page(true));
        blather.play(&dom).await.unwrap();

        let request = &chat.requests()[0];
        assert!(request.contains("word_from_first_list, word_from_second_list"));
        assert!(request.contains("spooky, happy"));
        assert!(request.contains("____"));

        let clicks = dom.clicks();
        assert!(clicks.contains(&"spooky".to_string()));
        assert!(clicks.contains(&"pirates".to_string()));
        assert!(clicks.contains(&SUBMIT_LABEL.to_string()));
        assert_eq!(
            blather.descriptions,
            vec!["It is a spooky story about pirates".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn describe_presses_skip_when_a_word_is_unclickable() {
        let chat = Arc::new(MockChatClient::scripted(["\"gloomy\""]));
        let mut blather = controller(Arc::clone(&chat));
        let dom = FixtureDom::single(describe_page(false));
        blather.play(&dom).await.unwrap();
        assert!(dom.clicks().contains(&SKIP_LABEL.to_string()));
        assert!(blather.descriptions.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn guesses_learn_from_wrong_attempts() {
        let chat = Arc::new(MockChatClient::scripted(["Dracula", "Frankenstein"]));
        let mut blather = controller(Arc::clone(&chat));
        let dom = FixtureDom::single(guess_page());

        blather.play(&dom).await.unwrap();
        assert_eq!(dom.typed(), vec![(GUESS_INPUT_ID.to_string(), "Dracula".to_string())]);
        assert!(chat.requests()[0].contains("story"));

        // Same page next tick: the previous guess was wrong.
        blather.play(&dom).await.unwrap();
        let second = &chat.requests()[1];
        assert!(second.contains("do not repeat them: Dracula"));
        assert_eq!(dom.typed().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn sustained_unknown_ends_the_guess_round() {
        let chat = Arc::new(MockChatClient::scripted(["Dracula"]));
        let mut blather = controller(Arc::clone(&chat));
        let dom = FixtureDom::new(vec![
            guess_page(),
            FixturePage::empty(),
            FixturePage::empty(),
            FixturePage::empty(),
        ]);
        blather.play(&dom).await.unwrap();
        assert_eq!(blather.last_guess.as_deref(), Some("Dracula"));
        for _ in 0..GUESS_UNKNOWN_RUN {
            dom.advance();
            blather.play(&dom).await.unwrap();
        }
        assert!(blather.last_guess.is_none());
        assert!(blather.wrong_guesses.is_empty());
    }

    #[test]
    fn presenting_tail_finds_most_recent_marker() {
        let context = "old line\nBob is presenting a: thing\nmore\nAlice is presenting a: story\ntail line";
        let (category, tail) = presenting_tail(context);
        assert_eq!(category.as_deref(), Some("story"));
        assert!(tail.starts_with("Alice is presenting a: story"));
        assert!(tail.ends_with("tail line"));
        assert!(!tail.contains("Bob"));
    }

    #[test]
    fn category_hints() {
        assert!(category_hint(Some("story")).contains("story"));
        assert!(category_hint(Some("PERSON")).contains("person"));
        assert!(category_hint(Some("place")).contains("place"));
        assert!(category_hint(Some("thing")).contains("thing"));
        assert!(category_hint(None).contains("well-known"));
    }

    #[test]
    fn describe_reply_parser_contract() {
        assert_eq!(
            parse_describe_reply("\"spooky\", \"pirates\""),
            vec!["spooky", "pirates"]
        );
        assert_eq!(parse_describe_reply("happy"), vec!["happy"]);
        assert_eq!(
            parse_describe_reply("'a', 'b'\nignored second line"),
            vec!["a", "b"]
        );
        assert!(parse_describe_reply("").is_empty());
    }
}
