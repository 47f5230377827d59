//! Job Job: interview questions answered in free text, the round-three
//! Blame Game, voting, and the applause screen where likes are handed out.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use jitb_chat_client::ChatClient;
use jitb_core_types::timing::POST_SUBMIT_DELAY;
use jitb_core_types::{Game, PageKind, Selector};
use jitb_dom_facade::{enabled_buttons, sanitize_label, Dom};
use jitb_page_classifier::{get_prompt, is_page, is_vote_page};

use crate::common::{
    answer_prompts, click_button, click_some_random, generate_answer_with_retry, vote_answers,
    vote_favorite_with_retry, CharLimit, PromptFields,
};
use crate::errors::GameError;
use crate::login::is_login_page;
use crate::GameController;

const INTERVIEW_QUESTION_ID: &str = "interview-question";
const INTERVIEW_INPUT_ID: &str = "interview-input";
const BLAME_PROMPT_ID: &str = "blame-prompt";
const LIKES_PROMPT_ID: &str = "likes-prompt";
const VOTE_PROMPT_ID: &str = "vote-prompt";
const LIKE_BUTTON_CLASS: &str = "like-button";
const SUBMIT_LABEL: &str = "SEND";

const BLAME_CLUES: &[&str] = &["blame"];
const LIKES_CLUES: &[&str] = &["send some love", "like your favorite", "add some love"];

const INTERVIEW_CHAR_LIMIT: usize = 80;
const MAX_LIKES: usize = 2;

const PERSONA: &str = "You are interviewing for a job in the party game Job Job. Answer \
                       interview questions earnestly but with a deadpan sense of humor.";

pub struct JobJob {
    chat: Arc<dyn ChatClient>,
    screen_name: String,
    last_kind: PageKind,
    last_prompt: Option<String>,
    last_vote: Option<String>,
}

impl JobJob {
    pub fn new(chat: Arc<dyn ChatClient>, screen_name: impl Into<String>) -> Self {
        chat.set_persona(PERSONA);
        Self {
            chat,
            screen_name: screen_name.into(),
            last_kind: PageKind::Unknown,
            last_prompt: None,
            last_vote: None,
        }
    }

    fn prompt_fields() -> PromptFields {
        PromptFields {
            prompt: Selector::id(INTERVIEW_QUESTION_ID),
            clues: &[],
            input: Selector::id(INTERVIEW_INPUT_ID),
            submit_label: SUBMIT_LABEL,
            limit: CharLimit::MaxLengthAttr,
            default_limit: INTERVIEW_CHAR_LIMIT,
        }
    }

    /// Round three: pick someone to blame, then justify it if the page asks.
    async fn play_blame(&mut self, dom: &dyn Dom) -> Result<(), GameError> {
        let text = match get_prompt(dom, &Selector::id(BLAME_PROMPT_ID), BLAME_CLUES, true).await
        {
            Ok(text) => text,
            Err(err) if err.is_mismatch() => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        let inventory = enabled_buttons(dom, None, &[SUBMIT_LABEL]).await?;
        if !inventory.is_empty() {
            let options: Vec<String> = inventory.iter().map(|b| b.label.clone()).collect();
            let favorite =
                match vote_favorite_with_retry(self.chat.as_ref(), &text, &options).await {
                    Ok(favorite) => favorite,
                    Err(err) => {
                        warn!(error = %err, "blame pick failed; taking the first");
                        options[0].clone()
                    }
                };
            let wanted = sanitize_label(&favorite);
            if let Some(button) = inventory.iter().find(|b| b.sanitized == wanted) {
                dom.click(&button.element).await?;
                info!(blamed = %favorite, "blame assigned");
            }
        }

        if let Some(input) = dom.locate(&Selector::id(INTERVIEW_INPUT_ID)).await? {
            let prompt = format!("{text}\nGive a short funny justification.");
            let answer = generate_answer_with_retry(
                self.chat.as_ref(),
                &prompt,
                INTERVIEW_CHAR_LIMIT,
            )
            .await?;
            if dom.type_text(&input, &answer).await? && click_button(dom, SUBMIT_LABEL).await? {
                info!(answer = %answer, "blame justified");
                sleep(POST_SUBMIT_DELAY).await;
            }
        }
        Ok(())
    }

    /// Applause screen: spread a bounded amount of love around.
    async fn play_likes(&mut self, dom: &dyn Dom) -> Result<(), GameError> {
        let buttons = dom.locate_all(&Selector::class(LIKE_BUTTON_CLASS)).await?;
        let mut clickable = Vec::new();
        for button in buttons {
            if dom.is_enabled(&button).await? {
                clickable.push(button);
            }
        }
        let given = click_some_random(dom, clickable, MAX_LIKES).await?;
        debug!(likes = given, "likes handed out");
        Ok(())
    }
}

#[async_trait]
impl GameController for JobJob {
    fn game(&self) -> Game {
        Game::JobJob
    }

    async fn id_page(&self, dom: &dyn Dom) -> PageKind {
        if is_page(dom, &Selector::id(BLAME_PROMPT_ID), BLAME_CLUES, true)
            .await
            .unwrap_or(false)
        {
            return PageKind::Blame;
        }
        if is_vote_page(dom, &Selector::id(VOTE_PROMPT_ID), true)
            .await
            .unwrap_or(false)
        {
            return PageKind::Vote;
        }
        if is_page(dom, &Selector::id(LIKES_PROMPT_ID), LIKES_CLUES, true)
            .await
            .unwrap_or(false)
        {
            return PageKind::WaitForLikes;
        }
        if is_page(dom, &Selector::id(INTERVIEW_QUESTION_ID), &[], false)
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
        if entered {
            debug!(player = %self.screen_name, from = %self.last_kind, to = %current, "page change");
            match current {
                PageKind::Blame => self.play_blame(dom).await?,
                PageKind::WaitForLikes => self.play_likes(dom).await?,
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
                    vote_answers(
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
