use std::fmt;

use serde::{Deserialize, Serialize};

/// Element lookup strategy understood by the DOM facade.
///
/// `Id`, `Class` and `Tag` are translated to CSS queries by the CDP
/// implementation; `XPath` is resolved by a tagging script. Values must be
/// non-empty; the constructors assert that in debug builds and the facade
/// rejects empty values at runtime.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    Id(String),
    Class(String),
    Tag(String),
    XPath(String),
    Css(String),
}

impl Selector {
    pub fn id(value: impl Into<String>) -> Self {
        let value = value.into();
        debug_assert!(!value.is_empty(), "empty id selector");
        Selector::Id(value)
    }

    pub fn class(value: impl Into<String>) -> Self {
        let value = value.into();
        debug_assert!(!value.is_empty(), "empty class selector");
        Selector::Class(value)
    }

    pub fn tag(value: impl Into<String>) -> Self {
        let value = value.into();
        debug_assert!(!value.is_empty(), "empty tag selector");
        Selector::Tag(value)
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        let value = value.into();
        debug_assert!(!value.is_empty(), "empty xpath selector");
        Selector::XPath(value)
    }

    pub fn css(value: impl Into<String>) -> Self {
        let value = value.into();
        debug_assert!(!value.is_empty(), "empty css selector");
        Selector::Css(value)
    }

    pub fn value(&self) -> &str {
        match self {
            Selector::Id(v)
            | Selector::Class(v)
            | Selector::Tag(v)
            | Selector::XPath(v)
            | Selector::Css(v) => v,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value().is_empty()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Id(v) => write!(f, "id={v}"),
            Selector::Class(v) => write!(f, "class={v}"),
            Selector::Tag(v) => write!(f, "tag={v}"),
            Selector::XPath(v) => write!(f, "xpath={v}"),
            Selector::Css(v) => write!(f, "css={v}"),
        }
    }
}
