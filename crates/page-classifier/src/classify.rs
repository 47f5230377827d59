use jitb_core_types::Selector;
use jitb_dom_facade::Dom;

use crate::errors::ClassifyError;
use crate::normalize::normalize_flat;

/// Clues shared by every game's voting screens.
pub const VOTE_CLUES: &[&str] = &[
    "vote",
    "which one",
    "favorite",
    "like more",
    "pick one",
];

/// Does the element at `selector` identify a page of the caller's kind?
///
/// With an empty clue list any non-empty text is sufficient (the "far
/// enough" mode). Otherwise at least one clue must occur in the text as a
/// case-insensitive substring. When `clean` is set the text is normalized
/// before matching.
pub async fn is_page(
    dom: &dyn Dom,
    selector: &Selector,
    clues: &[&str],
    clean: bool,
) -> Result<bool, ClassifyError> {
    match read_text(dom, selector, clean).await? {
        Some(text) => clues_match(&text, clues),
        None => Ok(false),
    }
}

/// [`is_page`] specialized to the shared vote clue list.
pub async fn is_vote_page(
    dom: &dyn Dom,
    selector: &Selector,
    clean: bool,
) -> Result<bool, ClassifyError> {
    is_page(dom, selector, VOTE_CLUES, clean).await
}

/// Extract the prompt text, failing when this is not a prompt page.
pub async fn get_prompt(
    dom: &dyn Dom,
    selector: &Selector,
    clues: &[&str],
    clean: bool,
) -> Result<String, ClassifyError> {
    extract(dom, selector, clues, clean, ClassifyError::NotPromptPage).await
}

/// Extract the vote text, failing when this is not a vote page.
pub async fn get_vote_text(
    dom: &dyn Dom,
    selector: &Selector,
    clean: bool,
) -> Result<String, ClassifyError> {
    extract(dom, selector, VOTE_CLUES, clean, ClassifyError::NotVotePage).await
}

async fn extract(
    dom: &dyn Dom,
    selector: &Selector,
    clues: &[&str],
    clean: bool,
    mismatch: ClassifyError,
) -> Result<String, ClassifyError> {
    let Some(element) = dom.locate(selector).await? else {
        return Err(ClassifyError::ElementMissing(selector.to_string()));
    };
    let raw = dom.text_of(&element).await?.unwrap_or_default();
    let text = if clean { normalize_flat(&raw) } else { raw };
    if text.trim().is_empty() {
        return Err(ClassifyError::EmptyText);
    }
    if !clues_match(&text, clues)? {
        return Err(mismatch);
    }
    Ok(text)
}

async fn read_text(
    dom: &dyn Dom,
    selector: &Selector,
    clean: bool,
) -> Result<Option<String>, ClassifyError> {
    let text = dom.text_at(selector).await?;
    Ok(text.map(|t| if clean { normalize_flat(&t) } else { t }))
}

fn clues_match(text: &str, clues: &[&str]) -> Result<bool, ClassifyError> {
    if clues.is_empty() {
        return Ok(!text.trim().is_empty());
    }
    let haystack = text.to_lowercase();
    for clue in clues {
        if clue.is_empty() {
            return Err(ClassifyError::EmptyClue);
        }
        if haystack.contains(&clue.to_lowercase()) {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jitb_dom_facade::{FixtureDom, FixtureElement, FixturePage};

    fn prompt_dom(text: &str) -> FixtureDom {
        FixtureDom::single(FixturePage::new(vec![FixtureElement::div(
            "question-text",
            text,
        )]))
    }

    #[tokio::test]
    async fn far_enough_mode_accepts_any_text() {
        let dom = prompt_dom("Anything at all");
        let sel = Selector::id("question-text");
        assert!(is_page(&dom, &sel, &[], false).await.unwrap());
    }

    #[tokio::test]
    async fn clue_matching_is_case_insensitive_substring() {
        let dom = prompt_dom("VOTE for your favorite!");
        let sel = Selector::id("question-text");
        assert!(is_page(&dom, &sel, &["vote"], false).await.unwrap());
        assert!(is_vote_page(&dom, &sel, false).await.unwrap());
        assert!(!is_page(&dom, &sel, &["thriplash"], false).await.unwrap());
    }

    #[tokio::test]
    async fn clean_matching_sees_through_typography() {
        let dom = prompt_dom("Which\u{00A0}one do you like\u{2026}");
        let sel = Selector::id("question-text");
        assert!(!is_page(&dom, &sel, &["which one"], false).await.unwrap());
        assert!(is_page(&dom, &sel, &["which one"], true).await.unwrap());
    }

    #[tokio::test]
    async fn missing_element_is_not_a_page() {
        let dom = FixtureDom::single(FixturePage::empty());
        let sel = Selector::id("question-text");
        assert!(!is_page(&dom, &sel, &[], false).await.unwrap());
    }

    #[tokio::test]
    async fn get_prompt_returns_text_or_fails_typed() {
        let dom = prompt_dom("Never take a first date to a ________");
        let sel = Selector::id("question-text");
        let prompt = get_prompt(&dom, &sel, &[], false).await.unwrap();
        assert_eq!(prompt, "Never take a first date to a ________");

        let err = get_prompt(&dom, &sel, &["vote"], false).await.unwrap_err();
        assert!(matches!(err, ClassifyError::NotPromptPage));

        let missing = Selector::id("nope");
        let err = get_prompt(&dom, &missing, &[], false).await.unwrap_err();
        assert!(matches!(err, ClassifyError::ElementMissing(_)));
    }

    #[tokio::test]
    async fn empty_clue_is_rejected() {
        let dom = prompt_dom("text");
        let sel = Selector::id("question-text");
        let err = is_page(&dom, &sel, &[""], false).await.unwrap_err();
        assert!(matches!(err, ClassifyError::EmptyClue));
    }

    #[tokio::test]
    async fn get_vote_text_symmetric() {
        let dom = prompt_dom("Pick your favorite answer");
        let sel = Selector::id("question-text");
        assert!(get_vote_text(&dom, &sel, false).await.is_ok());

        let dom = prompt_dom("Just a prompt");
        let err = get_vote_text(&dom, &sel, false).await.unwrap_err();
        assert!(matches!(err, ClassifyError::NotVotePage));
    }
}
