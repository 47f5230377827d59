//! Joke Boat: catchphrase pick, the timed topic round, joke setups and
//! punchlines, performing, and voting.
//!
//! The chat service allows only a handful of requests per minute, so the
//! topic round runs on a cache: at most three chat calls per round, the
//! first two bulk-generating examples for the displayed topic and the last
//! one covering every known topic at once.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use jitb_chat_client::{strip_enumeration, ChatClient, ChatMessage};
use jitb_core_types::timing::VOTE_IDLE_SLEEP;
use jitb_core_types::{Game, PageKind, Selector};
use jitb_dom_facade::{enabled_buttons, sanitize_label, Dom};
use jitb_page_classifier::{is_page, is_vote_page, normalize_flat};

use crate::common::{
    answer_prompts, click_button, raw_complete_with_retry, vote_favorite_with_retry, CharLimit,
    PromptFields,
};
use crate::errors::GameError;
use crate::login::is_login_page;
use crate::GameController;

const TOPIC_CATEGORY_ID: &str = "topic-category";
const TOPIC_INPUT_ID: &str = "topic-input";
const JOKE_PROMPT_ID: &str = "joke-prompt";
const JOKE_INPUT_ID: &str = "joke-input";
const CATCHPHRASE_ID: &str = "catchphrase-prompt";
const PERFORM_ID: &str = "perform-prompt";
const VOTE_PROMPT_ID: &str = "vote-prompt";
const SUBMIT_LABEL: &str = "SUBMIT";

const CATCHPHRASE_CLUES: &[&str] = &["catchphrase"];
const PERFORM_CLUES: &[&str] = &["perform"];

/// Chat calls allowed per topic round.
const TOPIC_CHAT_BUDGET: u32 = 3;
const BULK_EXAMPLES: usize = 10;
const JOKE_CHAR_LIMIT: usize = 80;

const PERSONA: &str = "You are a stand-up comedian playing the party game Joke Boat. Write \
                       punchy setups and punchlines. Keep every answer short.";

pub struct JokeBoat {
    chat: Arc<dyn ChatClient>,
    screen_name: String,
    last_kind: PageKind,
    last_prompt: Option<String>,
    last_vote: Option<String>,
    topic_cache: HashMap<String, VecDeque<String>>,
    topic_budget: u32,
}

impl JokeBoat {
    pub fn new(chat: Arc<dyn ChatClient>, screen_name: impl Into<String>) -> Self {
        chat.set_persona(PERSONA);
        Self {
            chat,
            screen_name: screen_name.into(),
            last_kind: PageKind::Unknown,
            last_prompt: None,
            last_vote: None,
            topic_cache: HashMap::new(),
            topic_budget: 0,
        }
    }

    fn prompt_fields() -> PromptFields {
        PromptFields {
            prompt: Selector::id(JOKE_PROMPT_ID),
            clues: &[],
            input: Selector::id(JOKE_INPUT_ID),
            submit_label: SUBMIT_LABEL,
            limit: CharLimit::MaxLengthAttr,
            default_limit: JOKE_CHAR_LIMIT,
        }
    }

    /// One topic tick: submit from the cache, or spend a budgeted chat call
    /// to refill it.
    async fn play_topic(&mut self, dom: &dyn Dom) -> Result<(), GameError> {
        let Some(raw) = dom.text_at(&Selector::id(TOPIC_CATEGORY_ID)).await? else {
            return Ok(());
        };
        let category = normalize_flat(&raw).trim().to_uppercase();
        if category.is_empty() {
            return Ok(());
        }
        self.topic_cache.entry(category.clone()).or_default();

        if let Some(example) = self
            .topic_cache
            .get_mut(&category)
            .and_then(VecDeque::pop_front)
        {
            return self.submit_topic_example(dom, &example).await;
        }

        if self.topic_budget == 0 {
            debug!(topic = %category, "chat budget for this topic round is spent");
            return Ok(());
        }
        if self.topic_budget > 1 {
            self.topic_budget -= 1;
            let prompt = format!(
                "Give {BULK_EXAMPLES} short examples of \"{category}\", one per line. \
                 No numbering, no commentary."
            );
            let reply = raw_complete_with_retry(
                self.chat.as_ref(),
                &[ChatMessage::system(PERSONA), ChatMessage::user(prompt)],
            )
            .await?;
            self.absorb_bulk(&category, &reply);
        } else {
            self.topic_budget -= 1;
            let reply = raw_complete_with_retry(
                self.chat.as_ref(),
                &[
                    ChatMessage::system(PERSONA),
                    ChatMessage::user(self.cross_topic_prompt()),
                ],
            )
            .await?;
            self.absorb_cross_topic(&reply);
        }

        if let Some(example) = self
            .topic_cache
            .get_mut(&category)
            .and_then(VecDeque::pop_front)
        {
            self.submit_topic_example(dom, &example).await?;
        }
        Ok(())
    }

    fn cross_topic_prompt(&self) -> String {
        let mut topics: Vec<&String> = self.topic_cache.keys().collect();
        topics.sort();
        let mut prompt = String::from(
            "Give one short example for each of these categories, one per line, formatted \
             exactly as CATEGORY: example\n",
        );
        for topic in topics {
            prompt.push_str(topic);
            prompt.push('\n');
        }
        prompt
    }

    fn absorb_bulk(&mut self, category: &str, reply: &str) {
        let queue = self.topic_cache.entry(category.to_string()).or_default();
        for line in reply.lines() {
            let example = clean_example(line);
            if !example.is_empty() {
                queue.push_back(example);
            }
        }
        debug!(topic = %category, cached = queue.len(), "bulk examples cached");
    }

    fn absorb_cross_topic(&mut self, reply: &str) {
        for line in reply.lines() {
            let Some((category, example)) = line.split_once(':') else {
                continue;
            };
            let category = category.trim().to_uppercase();
            let example = clean_example(example);
            if example.is_empty() {
                continue;
            }
            if let Some(queue) = self.topic_cache.get_mut(&category) {
                queue.push_back(example);
            }
        }
    }

    async fn submit_topic_example(
        &mut self,
        dom: &dyn Dom,
        example: &str,
    ) -> Result<(), GameError> {
        let Some(input) = dom.locate(&Selector::id(TOPIC_INPUT_ID)).await? else {
            return Ok(());
        };
        if dom.type_text(&input, example).await? && click_button(dom, SUBMIT_LABEL).await? {
            info!(example = %example, "submitted topic example");
            // The topic round runs on a timer; no long post-submit sleep.
            sleep(VOTE_IDLE_SLEEP).await;
        }
        Ok(())
    }

    async fn pick_catchphrase(&mut self, dom: &dyn Dom) -> Result<(), GameError> {
        let header = dom
            .text_at(&Selector::id(CATCHPHRASE_ID))
            .await?
            .unwrap_or_default();
        let inventory = enabled_buttons(dom, None, &[]).await?;
        if inventory.is_empty() {
            return Ok(());
        }
        let options: Vec<String> = inventory.iter().map(|b| b.label.clone()).collect();
        let prompt = format!("{header}\nPick the funniest catchphrase.");
        let favorite =
            match vote_favorite_with_retry(self.chat.as_ref(), &prompt, &options).await {
                Ok(favorite) => favorite,
                Err(err) => {
                    warn!(error = %err, "catchphrase pick failed; taking the first");
                    options[0].clone()
                }
            };
        let wanted = sanitize_label(&favorite);
        if let Some(button) = inventory.iter().find(|b| b.sanitized == wanted) {
            dom.click(&button.element).await?;
            info!(catchphrase = %favorite, "catchphrase chosen");
        }
        Ok(())
    }

    /// Stage fright: let the ship's robot read the joke.
    async fn choose_performer(&mut self, dom: &dyn Dom) -> Result<(), GameError> {
        let inventory = enabled_buttons(dom, None, &[]).await?;
        let pick = inventory
            .iter()
            .find(|b| b.sanitized.contains("robot"))
            .or_else(|| inventory.first());
        if let Some(button) = pick {
            dom.click(&button.element).await?;
            info!(choice = %button.label, "performer chosen");
        }
        Ok(())
    }
}

#[async_trait]
impl GameController for JokeBoat {
    fn game(&self) -> Game {
        Game::JokeBoat
    }

    async fn id_page(&self, dom: &dyn Dom) -> PageKind {
        if is_vote_page(dom, &Selector::id(VOTE_PROMPT_ID), true)
            .await
            .unwrap_or(false)
        {
            return PageKind::Vote;
        }
        if is_page(dom, &Selector::id(TOPIC_CATEGORY_ID), &[], false)
            .await
            .unwrap_or(false)
        {
            return PageKind::JokeTopic;
        }
        if is_page(dom, &Selector::id(CATCHPHRASE_ID), CATCHPHRASE_CLUES, true)
            .await
            .unwrap_or(false)
        {
            return PageKind::Catchphrase;
        }
        if is_page(dom, &Selector::id(PERFORM_ID), PERFORM_CLUES, true)
            .await
            .unwrap_or(false)
        {
            return PageKind::Perform;
        }
        if is_page(dom, &Selector::id(JOKE_PROMPT_ID), &[], false)
            .await
            .unwrap_or(false)
        {
            return PageKind::AnswerPrompt;
        }
        if is_login_page(dom).await.unwrap_or(false) {
            return PageKind::Login;
        }
        PageKind::Unknown
    }

    async fn play(&mut self, dom: &dyn Dom) -> Result<(), GameError> {
        let current = self.id_page(dom).await;
        let entered = current != self.last_kind;
        if entered || current.is_reentrant() {
            if entered {
                debug!(player = %self.screen_name, from = %self.last_kind, to = %current, "page change");
            }
            match current {
                PageKind::JokeTopic => {
                    if entered {
                        self.topic_budget = TOPIC_CHAT_BUDGET;
                    }
                    self.play_topic(dom).await?;
                }
                PageKind::Catchphrase => self.pick_catchphrase(dom).await?,
                PageKind::Perform => self.choose_performer(dom).await?,
                PageKind::AnswerPrompt => {
                    self.last_prompt = None;
                    let chat = Arc::clone(&self.chat);
                    answer_prompts(
                        dom,
                        chat.as_ref(),
                        &Self::prompt_fields(),
                        1,
                        &mut self.last_prompt,
                    )
                    .await?;
                }
                PageKind::Vote => {
                    self.last_vote = None;
                    let chat = Arc::clone(&self.chat);
                    crate::common::vote_answers(
                        dom,
                        chat.as_ref(),
                        &Selector::id(VOTE_PROMPT_ID),
                        &[],
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
}

fn clean_example(line: &str) -> String {
    strip_enumeration(line)
        .trim()
        .trim_matches(['"', '\''])
        .trim()
        .to_string()
}
