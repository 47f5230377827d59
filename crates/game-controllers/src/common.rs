//! Machinery shared by every controller: the prompt/answer loop, the vote
//! loop, avatar selection, and bounded chat retries.

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use jitb_chat_client::{ChatClient, ChatError, DEFAULT_MIN_FITB_LEN};
use jitb_core_types::timing::{
    AVATAR_CLICK_ATTEMPTS, CHAT_RETRY_BUDGET, POLL_INTERVAL, POST_SUBMIT_DELAY, PROMPT_SAMPLE_ATTEMPTS,
    VOTE_IDLE_LIMIT, VOTE_IDLE_SLEEP,
};
use jitb_core_types::Selector;
use jitb_dom_facade::{enabled_buttons, find_button, sanitize_label, Dom};
use jitb_page_classifier::{get_prompt, get_vote_text};

use crate::errors::GameError;

/// Fallback when neither a limit element nor a `maxlength` attribute shows.
pub const DEFAULT_CHAR_LIMIT: usize = 45;

/// Where a prompt page advertises its input-length constraint.
#[derive(Clone, Debug)]
pub enum CharLimit {
    /// The `maxlength` attribute of the input element itself.
    MaxLengthAttr,
    /// A read-only element whose text is the number.
    Element(Selector),
}

/// Concrete page wiring of a generic answer-prompt screen.
#[derive(Clone, Debug)]
pub struct PromptFields {
    pub prompt: Selector,
    pub clues: &'static [&'static str],
    pub input: Selector,
    pub submit_label: &'static str,
    pub limit: CharLimit,
    pub default_limit: usize,
}

/// Click the button with the given label, if present and enabled.
pub async fn click_button(dom: &dyn Dom, label: &str) -> Result<bool, GameError> {
    match find_button(dom, label).await? {
        Some(element) => Ok(dom.click(&element).await?),
        None => Ok(false),
    }
}

pub async fn read_char_limit(dom: &dyn Dom, fields: &PromptFields) -> Result<usize, GameError> {
    let read = match &fields.limit {
        CharLimit::MaxLengthAttr => match dom.locate(&fields.input).await? {
            Some(input) => dom.attr_of(&input, "maxlength").await?,
            None => None,
        },
        CharLimit::Element(selector) => dom.text_at(selector).await?,
    };
    Ok(read
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|limit| *limit > 0)
        .unwrap_or(fields.default_limit))
}

/// Answer up to `n` prompts in a row. Fails only when not a single answer
/// made it in.
pub async fn answer_prompts(
    dom: &dyn Dom,
    chat: &dyn ChatClient,
    fields: &PromptFields,
    n: u32,
    last_prompt: &mut Option<String>,
) -> Result<(), GameError> {
    let mut submitted = 0u32;
    for turn in 0..n {
        debug!(turn, "answer turn");
        if answer_prompt(dom, chat, fields, last_prompt).await? {
            submitted += 1;
        }
    }
    if submitted == 0 {
        return Err(GameError::NothingSubmitted);
    }
    Ok(())
}

/// One answer turn: sample a fresh prompt, generate, type, submit.
///
/// Returns false when the page morphed away or never produced a prompt that
/// differs from the previous one.
pub async fn answer_prompt(
    dom: &dyn Dom,
    chat: &dyn ChatClient,
    fields: &PromptFields,
    last_prompt: &mut Option<String>,
) -> Result<bool, GameError> {
    let mut prompt = None;
    for _ in 0..PROMPT_SAMPLE_ATTEMPTS {
        match get_prompt(dom, &fields.prompt, fields.clues, true).await {
            Ok(sample) if last_prompt.as_ref() != Some(&sample) => {
                prompt = Some(sample);
                break;
            }
            Ok(_) => sleep(POLL_INTERVAL).await,
            Err(err) if err.is_mismatch() => return Ok(false),
            Err(err) => return Err(err.into()),
        }
    }
    let Some(prompt) = prompt else {
        debug!("prompt never changed; skipping turn");
        return Ok(false);
    };

    let limit = read_char_limit(dom, fields).await?;
    let answer = generate_answer_with_retry(chat, &prompt, limit).await?;

    let Some(input) = dom.locate(&fields.input).await? else {
        return Ok(false);
    };
    if !dom.type_text(&input, &answer).await? {
        return Ok(false);
    }
    if !click_button(dom, fields.submit_label).await? {
        return Ok(false);
    }
    info!(prompt = %prompt, answer = %answer, "submitted answer");
    *last_prompt = Some(prompt);
    // Let the host advance; re-reading too early races into the same screen.
    sleep(POST_SUBMIT_DELAY).await;
    Ok(true)
}

/// Vote until the vote page disappears (or stays idle too long).
pub async fn vote_answers(
    dom: &dyn Dom,
    chat: &dyn ChatClient,
    vote_text: &Selector,
    blacklist: &[&str],
    last_vote: &mut Option<String>,
) -> Result<(), GameError> {
    let mut idle = 0u32;
    loop {
        let text = match get_vote_text(dom, vote_text, true).await {
            Ok(text) => text,
            Err(err) if err.is_mismatch() => break,
            Err(err) => return Err(err.into()),
        };
        if last_vote.as_ref() == Some(&text) {
            idle += 1;
            if idle >= VOTE_IDLE_LIMIT {
                debug!("vote page idle too long; leaving loop");
                break;
            }
            sleep(VOTE_IDLE_SLEEP).await;
            continue;
        }

        let inventory = enabled_buttons(dom, None, blacklist).await?;
        if inventory.is_empty() {
            idle += 1;
            if idle >= VOTE_IDLE_LIMIT {
                break;
            }
            sleep(VOTE_IDLE_SLEEP).await;
            continue;
        }
        idle = 0;

        let options: Vec<String> = inventory.iter().map(|b| b.label.clone()).collect();
        match vote_favorite_with_retry(chat, &text, &options).await {
            Ok(favorite) => {
                let wanted = sanitize_label(&favorite);
                match inventory.iter().find(|b| b.sanitized == wanted) {
                    Some(button) => {
                        if dom.click(&button.element).await? {
                            info!(vote = %favorite, "voted");
                        }
                    }
                    None => warn!(favorite = %favorite, "favorite not among buttons"),
                }
                *last_vote = Some(text);
            }
            // Click nothing this tick; the next one re-reads the page.
            Err(GameError::Chat(ChatError::NoSuchOption { reply })) => {
                warn!(reply = %reply, "model pick matched no option");
            }
            Err(err) => return Err(err),
        }
        sleep(POLL_INTERVAL).await;
    }
    Ok(())
}

/// Randomly click one of the allowed avatars, dropping candidates whose
/// click failed.
pub async fn select_avatar(dom: &dyn Dom, palette: &[&str]) -> Result<(), GameError> {
    let allowed: Vec<String> = palette.iter().map(|name| sanitize_label(name)).collect();
    let mut candidates = enabled_buttons(dom, None, &[])
        .await?
        .into_iter()
        .filter(|b| allowed.iter().any(|a| *a == b.sanitized))
        .collect::<Vec<_>>();
    for _ in 0..AVATAR_CLICK_ATTEMPTS {
        if candidates.is_empty() {
            break;
        }
        // Keep the rng out of scope across awaits; it is not Send.
        let index = rand::thread_rng().gen_range(0..candidates.len());
        let pick = candidates.swap_remove(index);
        if dom.click(&pick.element).await? {
            info!(avatar = %pick.label, "character selected");
            return Ok(());
        }
        debug!(avatar = %pick.label, "avatar click failed; trying another");
    }
    Err(GameError::AvatarFailed(AVATAR_CLICK_ATTEMPTS))
}

pub async fn generate_answer_with_retry(
    chat: &dyn ChatClient,
    prompt: &str,
    limit: usize,
) -> Result<String, GameError> {
    let mut attempt = 0;
    loop {
        match chat.generate_answer(prompt, limit, DEFAULT_MIN_FITB_LEN).await {
            Ok(answer) => return Ok(answer),
            Err(err) if err.is_retryable() && attempt + 1 < CHAT_RETRY_BUDGET => {
                attempt += 1;
                warn!(attempt, error = %err, "chat call failed; retrying");
                sleep(POLL_INTERVAL).await;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

pub async fn generate_multi_with_retry(
    chat: &dyn ChatClient,
    prompt: &str,
    n: usize,
    limit: usize,
) -> Result<Vec<String>, GameError> {
    let mut attempt = 0;
    loop {
        match chat.generate_multi(prompt, n, limit).await {
            Ok(answers) => return Ok(answers),
            Err(err) if err.is_retryable() && attempt + 1 < CHAT_RETRY_BUDGET => {
                attempt += 1;
                warn!(attempt, error = %err, "chat call failed; retrying");
                sleep(POLL_INTERVAL).await;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

pub async fn vote_favorite_with_retry(
    chat: &dyn ChatClient,
    prompt: &str,
    options: &[String],
) -> Result<String, GameError> {
    let mut attempt = 0;
    loop {
        match chat.vote_favorite(prompt, options).await {
            Ok(favorite) => return Ok(favorite),
            Err(err) if err.is_retryable() && attempt + 1 < CHAT_RETRY_BUDGET => {
                attempt += 1;
                warn!(attempt, error = %err, "chat call failed; retrying");
                sleep(POLL_INTERVAL).await;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

pub async fn raw_complete_with_retry(
    chat: &dyn ChatClient,
    messages: &[jitb_chat_client::ChatMessage],
) -> Result<String, GameError> {
    let mut attempt = 0;
    loop {
        match chat.raw_complete(messages).await {
            Ok(reply) => return Ok(reply),
            Err(err) if err.is_retryable() && attempt + 1 < CHAT_RETRY_BUDGET => {
                attempt += 1;
                warn!(attempt, error = %err, "chat call failed; retrying");
                sleep(POLL_INTERVAL).await;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Pick up to `count` random elements and click them (likes, applause).
pub async fn click_some_random(
    dom: &dyn Dom,
    candidates: Vec<jitb_dom_facade::ElementRef>,
    count: usize,
) -> Result<usize, GameError> {
    let mut pool = candidates;
    let mut clicked = 0;
    while clicked < count && !pool.is_empty() {
        let index = rand::thread_rng().gen_range(0..pool.len());
        let pick = pool.swap_remove(index);
        if dom.click(&pick).await? {
            clicked += 1;
        }
    }
    Ok(clicked)
}
