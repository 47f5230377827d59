//! DOM facade for the jitb player bot.
//!
//! Hides the concrete browser-automation library behind a minimal, total
//! interface: locate, read, click, type. Lookup misses and stale element
//! handles are swallowed into `None`/`false`; every other protocol failure
//! propagates as [`DomError`].

pub mod cdp;
pub mod errors;
pub mod facade;
pub mod fixture;

pub use cdp::{CdpDom, CdpDomConfig};
pub use errors::DomError;
pub use facade::{enabled_buttons, find_button, sanitize_label, Dom, ElementRef, LabeledButton};
pub use fixture::{FixtureDom, FixtureElement, FixturePage};
