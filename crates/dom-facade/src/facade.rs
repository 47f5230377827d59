use async_trait::async_trait;

use jitb_core_types::Selector;

use crate::errors::DomError;

/// Opaque handle to a located element.
///
/// Handles are only valid against the facade that produced them and may go
/// stale whenever the page re-renders; stale handles degrade to `None` /
/// `false` results, never to errors.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ElementRef(String);

impl ElementRef {
    pub(crate) fn new(key: impl Into<String>) -> Self {
        ElementRef(key.into())
    }

    pub(crate) fn key(&self) -> &str {
        &self.0
    }
}

/// Minimal, total interface over the controllable browser.
///
/// Implemented by [`crate::CdpDom`] for production and by
/// [`crate::FixtureDom`] for tests.
#[async_trait]
pub trait Dom: Send + Sync {
    /// Navigate the single page; invalidates all previously issued handles.
    async fn goto(&self, url: &str) -> Result<(), DomError>;

    /// First element matching the selector, `None` when absent.
    async fn locate(&self, selector: &Selector) -> Result<Option<ElementRef>, DomError>;

    /// All elements matching the selector, document order.
    async fn locate_all(&self, selector: &Selector) -> Result<Vec<ElementRef>, DomError>;

    /// Rendered text of the element; `None` when the handle is stale or the
    /// node carries no text.
    async fn text_of(&self, element: &ElementRef) -> Result<Option<String>, DomError>;

    /// Attribute value, `None` when absent or the handle is stale.
    async fn attr_of(&self, element: &ElementRef, name: &str)
        -> Result<Option<String>, DomError>;

    /// Click; `false` when the element is not interactable or stale.
    async fn click(&self, element: &ElementRef) -> Result<bool, DomError>;

    /// Focus and type; `false` when the element is not interactable.
    async fn type_text(&self, element: &ElementRef, text: &str) -> Result<bool, DomError>;

    /// `disabled` / `aria-disabled` check; stale handles count as disabled.
    async fn is_enabled(&self, element: &ElementRef) -> Result<bool, DomError>;

    /// All `button` elements under `root` (document when `None`).
    async fn buttons(&self, root: Option<&ElementRef>) -> Result<Vec<ElementRef>, DomError>;

    /// Raw page source, for error-banner scans.
    async fn page_source(&self) -> Result<String, DomError>;

    /// Convenience: locate then read text in one call.
    async fn text_at(&self, selector: &Selector) -> Result<Option<String>, DomError> {
        match self.locate(selector).await? {
            Some(element) => self.text_of(&element).await,
            None => Ok(None),
        }
    }
}

/// An enabled button with its visible label and the sanitized form used for
/// case-insensitive matching.
#[derive(Clone, Debug)]
pub struct LabeledButton {
    pub sanitized: String,
    pub label: String,
    pub element: ElementRef,
}

/// Lowercase and collapse whitespace so labels compare the way a player
/// reads them.
pub fn sanitize_label(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Inventory of enabled, labeled buttons under `root`, excluding any whose
/// sanitized label appears in `blacklist` (matched case-insensitively).
pub async fn enabled_buttons(
    dom: &dyn Dom,
    root: Option<&ElementRef>,
    blacklist: &[&str],
) -> Result<Vec<LabeledButton>, DomError> {
    let denied: Vec<String> = blacklist.iter().map(|b| sanitize_label(b)).collect();
    let mut inventory = Vec::new();
    for element in dom.buttons(root).await? {
        if !dom.is_enabled(&element).await? {
            continue;
        }
        let Some(label) = dom.text_of(&element).await? else {
            continue;
        };
        let label = label.trim().to_string();
        if label.is_empty() {
            continue;
        }
        let sanitized = sanitize_label(&label);
        if denied.iter().any(|d| *d == sanitized) {
            continue;
        }
        inventory.push(LabeledButton {
            sanitized,
            label,
            element,
        });
    }
    Ok(inventory)
}

/// First enabled button whose sanitized label equals (or, failing that,
/// contains) the sanitized `label`.
pub async fn find_button(
    dom: &dyn Dom,
    label: &str,
) -> Result<Option<ElementRef>, DomError> {
    let wanted = sanitize_label(label);
    let inventory = enabled_buttons(dom, None, &[]).await?;
    if let Some(hit) = inventory.iter().find(|b| b.sanitized == wanted) {
        return Ok(Some(hit.element.clone()));
    }
    Ok(inventory
        .into_iter()
        .find(|b| b.sanitized.contains(&wanted))
        .map(|b| b.element))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_collapses_and_lowercases() {
        assert_eq!(sanitize_label("  SAFETY   Quip \n"), "safety quip");
        assert_eq!(sanitize_label("Send"), "send");
        assert_eq!(sanitize_label(""), "");
    }
}
