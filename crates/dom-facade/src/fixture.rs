//! In-memory scripted DOM double for tests.
//!
//! A fixture holds a queue of page snapshots. Lookups resolve against the
//! front snapshot; clicking a button whose label was registered with
//! [`FixtureDom::advance_on_click`] pops the queue, which also invalidates
//! every handle issued against the previous snapshot (modeling staleness).

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;

use jitb_core_types::Selector;

use crate::errors::DomError;
use crate::facade::{sanitize_label, Dom, ElementRef};

#[derive(Clone, Debug)]
pub struct FixtureElement {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub enabled: bool,
    pub interactable: bool,
    /// Id of the containing element, for root-scoped button queries.
    pub parent: Option<String>,
}

impl FixtureElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            text: String::new(),
            attrs: HashMap::new(),
            enabled: true,
            interactable: true,
            parent: None,
        }
    }

    pub fn button(label: impl Into<String>) -> Self {
        Self::new("button").with_text(label)
    }

    pub fn div(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new("div").with_id(id).with_text(text)
    }

    pub fn textarea(id: impl Into<String>) -> Self {
        Self::new("textarea").with_id(id)
    }

    pub fn input(id: impl Into<String>) -> Self {
        Self::new("input").with_id(id)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn inert(mut self) -> Self {
        self.interactable = false;
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent = Some(parent_id.into());
        self
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Id(v) => self.id.as_deref() == Some(v.as_str()),
            Selector::Class(v) => self.classes.iter().any(|c| c == v),
            Selector::Tag(v) => self.tag.eq_ignore_ascii_case(v),
            Selector::Css(v) => match v.strip_prefix('#') {
                Some(id) => self.id.as_deref() == Some(id),
                None => match v.strip_prefix('.') {
                    Some(class) => self.classes.iter().any(|c| c == class),
                    None => self.tag.eq_ignore_ascii_case(v),
                },
            },
            // The fixture does not speak XPath; production code that needs it
            // is exercised against the real facade.
            Selector::XPath(_) => false,
        }
    }

    fn label(&self) -> String {
        if !self.text.is_empty() {
            self.text.clone()
        } else {
            self.id.clone().unwrap_or_else(|| self.tag.clone())
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FixturePage {
    pub elements: Vec<FixtureElement>,
}

impl FixturePage {
    pub fn new(elements: Vec<FixtureElement>) -> Self {
        Self { elements }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Default)]
struct Inner {
    pages: VecDeque<FixturePage>,
    epoch: usize,
    clicks: Vec<String>,
    typed: Vec<(String, String)>,
    advance_on: Vec<String>,
    source_extra: String,
    visited: Vec<String>,
}

impl Inner {
    fn current(&self) -> Option<&FixturePage> {
        self.pages.front()
    }

    fn advance(&mut self) {
        self.pages.pop_front();
        self.epoch += 1;
    }
}

/// Scripted [`Dom`] implementation.
#[derive(Default)]
pub struct FixtureDom {
    inner: Mutex<Inner>,
}

impl FixtureDom {
    pub fn new(pages: Vec<FixturePage>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                pages: pages.into(),
                ..Inner::default()
            }),
        }
    }

    pub fn single(page: FixturePage) -> Self {
        Self::new(vec![page])
    }

    /// Clicking an enabled button with this (sanitized) label pops the page
    /// queue, invalidating all outstanding handles.
    pub fn advance_on_click(&self, label: &str) {
        self.inner.lock().advance_on.push(sanitize_label(label));
    }

    /// Manually flip to the next snapshot.
    pub fn advance(&self) {
        self.inner.lock().advance();
    }

    /// Extra raw text appended to `page_source`, for error-banner scans.
    pub fn set_source_extra(&self, extra: impl Into<String>) {
        self.inner.lock().source_extra = extra.into();
    }

    pub fn clicks(&self) -> Vec<String> {
        self.inner.lock().clicks.clone()
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.inner.lock().typed.clone()
    }

    pub fn visited(&self) -> Vec<String> {
        self.inner.lock().visited.clone()
    }

    pub fn remaining_pages(&self) -> usize {
        self.inner.lock().pages.len()
    }

    fn make_ref(epoch: usize, index: usize) -> ElementRef {
        ElementRef::new(format!("{epoch}:{index}"))
    }

    fn resolve(inner: &Inner, element: &ElementRef) -> Option<usize> {
        let (epoch, index) = element.key().split_once(':')?;
        let epoch: usize = epoch.parse().ok()?;
        let index: usize = index.parse().ok()?;
        if epoch != inner.epoch {
            return None; // stale handle from a previous snapshot
        }
        let page = inner.current()?;
        (index < page.elements.len()).then_some(index)
    }
}

#[async_trait]
impl Dom for FixtureDom {
    async fn goto(&self, url: &str) -> Result<(), DomError> {
        self.inner.lock().visited.push(url.to_string());
        Ok(())
    }

    async fn locate(&self, selector: &Selector) -> Result<Option<ElementRef>, DomError> {
        if selector.is_empty() {
            return Err(DomError::EmptySelector);
        }
        let inner = self.inner.lock();
        let Some(page) = inner.current() else {
            return Ok(None);
        };
        Ok(page
            .elements
            .iter()
            .position(|el| el.matches(selector))
            .map(|index| Self::make_ref(inner.epoch, index)))
    }

    async fn locate_all(&self, selector: &Selector) -> Result<Vec<ElementRef>, DomError> {
        if selector.is_empty() {
            return Err(DomError::EmptySelector);
        }
        let inner = self.inner.lock();
        let Some(page) = inner.current() else {
            return Ok(Vec::new());
        };
        Ok(page
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| el.matches(selector))
            .map(|(index, _)| Self::make_ref(inner.epoch, index))
            .collect())
    }

    async fn text_of(&self, element: &ElementRef) -> Result<Option<String>, DomError> {
        let inner = self.inner.lock();
        Ok(Self::resolve(&inner, element).and_then(|index| {
            let text = &inner.current().unwrap().elements[index].text;
            (!text.is_empty()).then(|| text.clone())
        }))
    }

    async fn attr_of(
        &self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, DomError> {
        let inner = self.inner.lock();
        Ok(Self::resolve(&inner, element).and_then(|index| {
            inner.current().unwrap().elements[index]
                .attrs
                .get(name)
                .cloned()
        }))
    }

    async fn click(&self, element: &ElementRef) -> Result<bool, DomError> {
        let mut inner = self.inner.lock();
        let Some(index) = Self::resolve(&inner, element) else {
            return Ok(false);
        };
        let el = &inner.current().unwrap().elements[index];
        if !el.interactable || !el.enabled {
            return Ok(false);
        }
        let label = el.label();
        let sanitized = sanitize_label(&label);
        inner.clicks.push(label);
        if inner.advance_on.iter().any(|a| *a == sanitized) {
            inner.advance();
        }
        Ok(true)
    }

    async fn type_text(&self, element: &ElementRef, text: &str) -> Result<bool, DomError> {
        let mut inner = self.inner.lock();
        let Some(index) = Self::resolve(&inner, element) else {
            return Ok(false);
        };
        let el = &inner.current().unwrap().elements[index];
        if !el.interactable || !el.enabled {
            return Ok(false);
        }
        if !matches!(el.tag.as_str(), "input" | "textarea") {
            return Ok(false);
        }
        let target = el.id.clone().unwrap_or_else(|| el.tag.clone());
        inner.typed.push((target, text.to_string()));
        Ok(true)
    }

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool, DomError> {
        let inner = self.inner.lock();
        Ok(Self::resolve(&inner, element)
            .map(|index| inner.current().unwrap().elements[index].enabled)
            .unwrap_or(false))
    }

    async fn buttons(&self, root: Option<&ElementRef>) -> Result<Vec<ElementRef>, DomError> {
        let Some(root) = root else {
            return self.locate_all(&Selector::tag("button")).await;
        };
        let inner = self.inner.lock();
        let Some(root_index) = Self::resolve(&inner, root) else {
            return Ok(Vec::new());
        };
        let page = inner.current().unwrap();
        let Some(root_id) = page.elements[root_index].id.clone() else {
            return Ok(Vec::new());
        };
        Ok(page
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| {
                el.tag.eq_ignore_ascii_case("button")
                    && el.parent.as_deref() == Some(root_id.as_str())
            })
            .map(|(index, _)| Self::make_ref(inner.epoch, index))
            .collect())
    }

    async fn page_source(&self) -> Result<String, DomError> {
        let inner = self.inner.lock();
        let mut source = String::new();
        if let Some(page) = inner.current() {
            for el in &page.elements {
                source.push_str(&el.text);
                source.push('\n');
            }
        }
        source.push_str(&inner.source_extra);
        Ok(source)
    }
}
