//! The answer-polish pipeline.
//!
//! Chat models love to wrap answers in quotes and to repeat the prompt text
//! around their insertion point. Polishing strips matched quotes, removes
//! prompt overlap on both sides of a fill-in-the-blank, enforces the length
//! limit, and drops a lone trailing period. The pipeline is pure and
//! idempotent: polishing a polished answer is a no-op.

use crate::errors::ChatError;

/// Minimum underscore-run length that counts as a fill-in-the-blank marker.
pub const DEFAULT_MIN_FITB_LEN: usize = 4;

/// Quote pairs stripped when they wrap the whole answer.
const QUOTE_PAIRS: &[(char, char)] = &[
    ('"', '"'),
    ('\'', '\''),
    ('\u{201C}', '\u{201D}'),
    ('\u{2018}', '\u{2019}'),
];

/// Polish one model answer against the prompt it was generated for.
pub fn polish_answer(
    prompt: &str,
    answer: &str,
    length_limit: usize,
    min_fitb_len: usize,
) -> Result<String, ChatError> {
    if length_limit == 0 || min_fitb_len == 0 {
        return Err(ChatError::InvalidLimit);
    }
    if prompt.trim().is_empty() {
        return Err(ChatError::EmptyPrompt);
    }

    let fitb = single_fitb(prompt, min_fitb_len);
    let mut current = answer.trim().to_string();
    loop {
        let mut next = strip_matched_quotes(&current);
        if let Some((lead, tail)) = &fitb {
            next = strip_lead_overlap(&next, lead);
            next = cut_tail_overlap(&next, tail);
        }
        let next = next.trim().to_string();
        if next == current {
            break;
        }
        current = next;
    }

    // Truncate before the dot strip; the other order re-shortens on a second
    // pass and breaks idempotence.
    let mut polished: String = current.chars().take(length_limit).collect();
    polished.truncate(polished.trim_end().len());
    let polished = strip_single_trailing_dot(&polished);
    let polished = polished.trim();
    if polished.is_empty() {
        return Err(ChatError::EmptyAnswer);
    }
    Ok(polished.to_string())
}

/// LEAD/TAIL split of `prompt` when it contains exactly one
/// fill-in-the-blank marker.
pub fn single_fitb(prompt: &str, min_len: usize) -> Option<(String, String)> {
    let mut runs: Vec<(usize, usize)> = Vec::new();
    let mut run_start: Option<usize> = None;
    for (idx, ch) in prompt.char_indices() {
        if ch == '_' {
            run_start.get_or_insert(idx);
        } else if let Some(start) = run_start.take() {
            if prompt[start..idx].chars().count() >= min_len {
                runs.push((start, idx));
            }
        }
    }
    if let Some(start) = run_start {
        if prompt[start..].chars().count() >= min_len {
            runs.push((start, prompt.len()));
        }
    }
    match runs.as_slice() {
        [(start, end)] => Some((prompt[..*start].to_string(), prompt[*end..].to_string())),
        _ => None,
    }
}

fn strip_matched_quotes(answer: &str) -> String {
    let mut current = answer.trim();
    loop {
        let mut chars = current.chars();
        let (Some(first), Some(last)) = (chars.next(), current.chars().next_back()) else {
            break;
        };
        if current.chars().count() < 2 {
            break;
        }
        let matched = QUOTE_PAIRS
            .iter()
            .any(|(open, close)| first == *open && last == *close);
        if !matched {
            break;
        }
        current = current[first.len_utf8()..current.len() - last.len_utf8()].trim();
    }
    current.to_string()
}

/// Byte offset in `haystack` just past a case-insensitive match of `needle`
/// at its start, or `None`.
fn ci_starts_with(haystack: &str, needle: &str) -> Option<usize> {
    let mut indices = haystack.char_indices();
    for expected in needle.chars() {
        match indices.next() {
            Some((_, actual)) if actual.to_lowercase().eq(expected.to_lowercase()) => {}
            _ => return None,
        }
    }
    Some(indices.next().map(|(idx, _)| idx).unwrap_or(haystack.len()))
}

/// Remove the longest prefix of `answer` that equals a suffix of `lead`,
/// case-insensitively. A match is accepted only on a word boundary: either
/// the matched text ends in a non-alphanumeric character or the answer
/// continues with one.
fn strip_lead_overlap(answer: &str, lead: &str) -> String {
    for (idx, _) in lead.char_indices() {
        let suffix = &lead[idx..];
        if suffix.chars().all(char::is_whitespace) {
            break;
        }
        if let Some(end) = ci_starts_with(answer, suffix) {
            let at_boundary = suffix
                .chars()
                .next_back()
                .map(|c| !c.is_alphanumeric())
                .unwrap_or(false)
                || answer[end..]
                    .chars()
                    .next()
                    .map(|c| !c.is_alphanumeric())
                    .unwrap_or(true);
            if at_boundary {
                return answer[end..].trim_start().to_string();
            }
        }
    }
    answer.to_string()
}

/// Cut `answer` at the first occurrence of the longest prefix of `tail`
/// found in it (at least 3 characters or the whole tail, word-boundary
/// anchored on both sides), dropping everything from the match to the end.
fn cut_tail_overlap(answer: &str, tail: &str) -> String {
    let tail = tail.trim();
    if tail.is_empty() {
        return answer.to_string();
    }
    let tail_len = tail.chars().count();
    let min_len = tail_len.min(3);
    for take in (min_len..=tail_len).rev() {
        let prefix: String = tail.chars().take(take).collect();
        if prefix.chars().all(char::is_whitespace) {
            continue;
        }
        let mut prev: Option<char> = None;
        for (idx, ch) in answer.char_indices() {
            let starts_word = prev.map(|c| !c.is_alphanumeric()).unwrap_or(true);
            prev = Some(ch);
            if !starts_word {
                continue;
            }
            let Some(end) = ci_starts_with(&answer[idx..], &prefix) else {
                continue;
            };
            let whole_tail = take == tail_len;
            let ends_word = answer[idx + end..]
                .chars()
                .next()
                .map(|c| !c.is_alphanumeric())
                .unwrap_or(true);
            if whole_tail || ends_word {
                return answer[..idx].trim_end().to_string();
            }
        }
    }
    answer.to_string()
}

fn strip_single_trailing_dot(answer: &str) -> String {
    match answer.strip_suffix('.') {
        // An ellipsis is content, not punctuation noise.
        Some(rest) if !rest.ends_with('.') => rest.to_string(),
        _ => answer.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polish(prompt: &str, answer: &str, limit: usize) -> String {
        polish_answer(prompt, answer, limit, DEFAULT_MIN_FITB_LEN).unwrap()
    }

    // The four seed scenarios.

    #[test]
    fn no_fitb_passes_through() {
        assert_eq!(
            polish(
                "This prompt does not have a fill-in-the-blank",
                "I agree that it does not",
                45
            ),
            "I agree that it does not"
        );
    }

    #[test]
    fn trailing_overlap_and_leading_article() {
        assert_eq!(
            polish(
                "Never take a first date to a ________",
                "a funeral home.",
                45
            ),
            "funeral home"
        );
    }

    #[test]
    fn leading_and_trailing_overlap() {
        assert_eq!(
            polish(
                "Some say that ________ is unnecessary",
                "Some say that testing is unnecessary",
                45
            ),
            "testing"
        );
    }

    #[test]
    fn quote_wrap_overlap_and_truncation() {
        assert_eq!(
            polish(
                "I think ________ is a great name for a superhero who can communicate with cats",
                "\"Feline Friend Fatale\" is a great name!",
                10
            ),
            "Feline Fri"
        );
    }

    // Laws.

    #[test]
    fn idempotent() {
        let cases = [
            (
                "Never take a first date to a ________",
                "a funeral home.",
                45,
            ),
            (
                "Some say that ________ is unnecessary",
                "Some say that testing is unnecessary",
                45,
            ),
            (
                "I think ________ is a great name for a superhero who can communicate with cats",
                "\"Feline Friend Fatale\" is a great name!",
                10,
            ),
            ("A prompt with no blank", "  \"short answer?\"  ", 45),
        ];
        for (prompt, answer, limit) in cases {
            let once = polish(prompt, answer, limit);
            assert_eq!(polish(prompt, &once, limit), once, "case: {answer:?}");
        }
    }

    #[test]
    fn length_is_enforced_in_chars() {
        let out = polish("No blank here", "aaaaaaaaaaaaaaaaaaaa", 5);
        assert_eq!(out.chars().count(), 5);
        // Multi-byte chars count as one.
        let out = polish("No blank here", "éééééééééé", 4);
        assert_eq!(out.chars().count(), 4);
    }

    #[test]
    fn no_fitb_means_no_overlap_stripping() {
        // Short underscore runs are not blanks.
        let out = polish("A __ B", "A __ B says hi", 45);
        assert_eq!(out, "A __ B says hi");
    }

    #[test]
    fn two_blanks_disable_overlap_stripping() {
        let prompt = "________ and ________ walk into a bar";
        assert_eq!(polish(prompt, "gin and tonic", 45), "gin and tonic");
    }

    #[test]
    fn overlap_is_case_insensitive() {
        assert_eq!(
            polish(
                "Some say that ________ is unnecessary",
                "SOME SAY THAT testing IS UNNECESSARY",
                45
            ),
            "testing"
        );
    }

    #[test]
    fn matched_quotes_stripped_unmatched_preserved() {
        assert_eq!(polish("No blank", "\"wrapped\"", 45), "wrapped");
        assert_eq!(polish("No blank", "'wrapped'", 45), "wrapped");
        assert_eq!(polish("No blank", "\u{201C}wrapped\u{201D}", 45), "wrapped");
        assert_eq!(polish("No blank", "\"unmatched", 45), "\"unmatched");
        assert_eq!(polish("No blank", "don't", 45), "don't");
    }

    #[test]
    fn nested_quotes_strip_until_stable() {
        assert_eq!(polish("No blank", "\"'both'\"", 45), "both");
    }

    #[test]
    fn bang_and_question_survive_dot_does_not() {
        assert_eq!(polish("No blank", "really?", 45), "really?");
        assert_eq!(polish("No blank", "wow!", 45), "wow!");
        assert_eq!(polish("No blank", "period.", 45), "period");
        assert_eq!(polish("No blank", "wait for it...", 45), "wait for it...");
    }

    #[test]
    fn underscores_in_answer_survive() {
        assert_eq!(polish("No blank", "snake_case_name", 45), "snake_case_name");
    }

    #[test]
    fn empty_answer_after_polish_is_an_error() {
        let err = polish_answer("No blank", "\"\"", 45, DEFAULT_MIN_FITB_LEN).unwrap_err();
        assert!(matches!(err, ChatError::EmptyAnswer));
        let err = polish_answer(
            "Some say that ________ is unnecessary",
            "Some say that is unnecessary",
            45,
            DEFAULT_MIN_FITB_LEN,
        );
        assert!(matches!(err, Err(ChatError::EmptyAnswer)));
    }

    #[test]
    fn zero_limits_are_rejected() {
        assert!(matches!(
            polish_answer("p", "a", 0, DEFAULT_MIN_FITB_LEN),
            Err(ChatError::InvalidLimit)
        ));
        assert!(matches!(
            polish_answer("p", "a", 45, 0),
            Err(ChatError::InvalidLimit)
        ));
    }

    #[test]
    fn empty_prompt_is_rejected() {
        assert!(matches!(
            polish_answer("  ", "a", 45, DEFAULT_MIN_FITB_LEN),
            Err(ChatError::EmptyPrompt)
        ));
    }

    #[test]
    fn fitb_split() {
        let (lead, tail) =
            single_fitb("Never take a first date to a ________", DEFAULT_MIN_FITB_LEN).unwrap();
        assert_eq!(lead, "Never take a first date to a ");
        assert_eq!(tail, "");
        let (lead, tail) =
            single_fitb("Some say that ________ is unnecessary", DEFAULT_MIN_FITB_LEN).unwrap();
        assert_eq!(lead, "Some say that ");
        assert_eq!(tail, " is unnecessary");
        assert!(single_fitb("no blanks at all", DEFAULT_MIN_FITB_LEN).is_none());
        assert!(single_fitb("a __ b", DEFAULT_MIN_FITB_LEN).is_none());
        assert!(single_fitb("____ and ____", DEFAULT_MIN_FITB_LEN).is_none());
    }

    #[test]
    fn partial_word_overlap_is_not_stripped() {
        // LEAD ends with "a" but the answer word is "apple"; no boundary.
        assert_eq!(
            polish("Bring a ________ to the party", "apple pie", 45),
            "apple pie"
        );
    }
}
