use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use dashmap::DashMap;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use jitb_core_types::Selector;

use crate::errors::DomError;
use crate::facade::{Dom, ElementRef};

/// Attribute used to read back script-resolved (XPath) nodes as CSS.
const LOCATOR_ATTR: &str = "data-jitb-loc";

/// Handles outlive a single tick only; past this the registry is cleared
/// wholesale and stale refs degrade to misses.
const REGISTRY_CAP: usize = 2048;

#[derive(Clone, Debug)]
pub struct CdpDomConfig {
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
    pub window: (u32, u32),
}

impl Default for CdpDomConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            window: (1280, 900),
        }
    }
}

/// Production facade: one Chromium, one page, for the life of the process.
pub struct CdpDom {
    browser: Mutex<Option<Browser>>,
    page: Page,
    registry: DashMap<String, Arc<Element>>,
    handler_task: JoinHandle<()>,
}

impl CdpDom {
    pub async fn launch(config: CdpDomConfig) -> Result<Self, DomError> {
        let mut builder = BrowserConfig::builder().window_size(config.window.0, config.window.1);
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder.build().map_err(DomError::Launch)?;
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|err| DomError::Launch(err.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|err| DomError::Launch(err.to_string()))?;

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            registry: DashMap::new(),
            handler_task,
        })
    }

    /// Close the browser; safe to call more than once.
    pub async fn close(&self) {
        let mut guard = self.browser.lock().await;
        if let Some(mut browser) = guard.take() {
            if let Err(err) = browser.close().await {
                warn!(error = %err, "browser close failed");
            }
            if let Err(err) = browser.wait().await {
                debug!(error = %err, "browser wait failed");
            }
        }
        self.handler_task.abort();
    }

    fn remember(&self, element: Element) -> ElementRef {
        if self.registry.len() >= REGISTRY_CAP {
            self.registry.clear();
        }
        let key = Uuid::new_v4().to_string();
        self.registry.insert(key.clone(), Arc::new(element));
        ElementRef::new(key)
    }

    fn lookup(&self, element: &ElementRef) -> Option<Arc<Element>> {
        self.registry
            .get(element.key())
            .map(|entry| Arc::clone(entry.value()))
    }

    fn css_of(selector: &Selector) -> Result<Option<String>, DomError> {
        if selector.is_empty() {
            return Err(DomError::EmptySelector);
        }
        Ok(match selector {
            Selector::Id(v) => Some(format!("#{v}")),
            Selector::Class(v) => Some(format!(".{v}")),
            Selector::Tag(v) => Some(v.clone()),
            Selector::Css(v) => Some(v.clone()),
            Selector::XPath(_) => None,
        })
    }

    async fn find_css_all(&self, css: &str) -> Result<Vec<ElementRef>, DomError> {
        match self.page.find_elements(css).await {
            Ok(elements) => Ok(elements
                .into_iter()
                .map(|element| self.remember(element))
                .collect()),
            Err(err) if is_miss(&err) => Ok(Vec::new()),
            Err(err) => Err(DomError::CdpIo(err.to_string())),
        }
    }

    /// Resolve an XPath by tagging each hit with a token attribute from
    /// evaluated script, then reading the tokens back as a CSS query.
    async fn find_xpath_all(&self, xpath: &str) -> Result<Vec<ElementRef>, DomError> {
        let token = Uuid::new_v4().simple().to_string();
        let query = serde_json::to_string(xpath)
            .map_err(|err| DomError::Script(err.to_string()))?;
        let script = format!(
            r#"(() => {{
                const query = {query};
                const token = "{token}";
                let tagged = 0;
                try {{
                    const snapshot = document.evaluate(
                        query, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
                    for (let i = 0; i < snapshot.snapshotLength; i++) {{
                        const node = snapshot.snapshotItem(i);
                        if (node && node.setAttribute) {{
                            node.setAttribute("{LOCATOR_ATTR}", token + "-" + i);
                            tagged += 1;
                        }}
                    }}
                }} catch (e) {{
                    return -1;
                }}
                return tagged;
            }})()"#
        );
        let tagged: i64 = self
            .page
            .evaluate(script)
            .await
            .map_err(|err| DomError::Script(err.to_string()))?
            .into_value()
            .map_err(|err| DomError::Script(err.to_string()))?;
        if tagged < 0 {
            return Err(DomError::Script(format!("invalid xpath: {xpath}")));
        }
        if tagged == 0 {
            return Ok(Vec::new());
        }
        self.find_css_all(&format!(r#"[{LOCATOR_ATTR}^="{token}-"]"#))
            .await
    }
}

#[async_trait]
impl Dom for CdpDom {
    async fn goto(&self, url: &str) -> Result<(), DomError> {
        self.registry.clear();
        self.page
            .goto(url)
            .await
            .map_err(|err| DomError::Navigation(err.to_string()))?;
        // Best effort; SPAs keep loading long after the navigation settles.
        if let Err(err) = self.page.wait_for_navigation().await {
            debug!(error = %err, "wait_for_navigation failed");
        }
        Ok(())
    }

    async fn locate(&self, selector: &Selector) -> Result<Option<ElementRef>, DomError> {
        match Self::css_of(selector)? {
            Some(css) => match self.page.find_element(css).await {
                Ok(element) => Ok(Some(self.remember(element))),
                Err(err) if is_miss(&err) => Ok(None),
                Err(err) => Err(DomError::CdpIo(err.to_string())),
            },
            None => Ok(self
                .find_xpath_all(selector.value())
                .await?
                .into_iter()
                .next()),
        }
    }

    async fn locate_all(&self, selector: &Selector) -> Result<Vec<ElementRef>, DomError> {
        match Self::css_of(selector)? {
            Some(css) => self.find_css_all(&css).await,
            None => self.find_xpath_all(selector.value()).await,
        }
    }

    async fn text_of(&self, element: &ElementRef) -> Result<Option<String>, DomError> {
        let Some(element) = self.lookup(element) else {
            return Ok(None);
        };
        match element.inner_text().await {
            Ok(text) => Ok(text.filter(|t| !t.is_empty())),
            Err(err) if is_miss(&err) => Ok(None),
            Err(err) => Err(DomError::CdpIo(err.to_string())),
        }
    }

    async fn attr_of(
        &self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, DomError> {
        let Some(element) = self.lookup(element) else {
            return Ok(None);
        };
        match element.attribute(name).await {
            Ok(value) => Ok(value),
            Err(err) if is_miss(&err) => Ok(None),
            Err(err) => Err(DomError::CdpIo(err.to_string())),
        }
    }

    async fn click(&self, element: &ElementRef) -> Result<bool, DomError> {
        let Some(element) = self.lookup(element) else {
            return Ok(false);
        };
        match element.click().await {
            Ok(_) => Ok(true),
            Err(err) if is_miss(&err) || is_not_interactable(&err) => {
                debug!(error = %err, "click swallowed");
                Ok(false)
            }
            Err(err) => Err(DomError::CdpIo(err.to_string())),
        }
    }

    async fn type_text(&self, element: &ElementRef, text: &str) -> Result<bool, DomError> {
        let Some(element) = self.lookup(element) else {
            return Ok(false);
        };
        let typed = async {
            element.focus().await?;
            // Clear any previous value so re-entrant prompts start fresh.
            element
                .call_js_fn(
                    "function() { \
                         if ('value' in this) { \
                             this.value = ''; \
                             this.dispatchEvent(new Event('input', { bubbles: true })); \
                         } \
                     }",
                    true,
                )
                .await?;
            element.type_str(text).await?;
            Ok::<_, CdpError>(())
        }
        .await;
        match typed {
            Ok(()) => Ok(true),
            Err(err) if is_miss(&err) || is_not_interactable(&err) => {
                debug!(error = %err, "type_text swallowed");
                Ok(false)
            }
            Err(err) => Err(DomError::CdpIo(err.to_string())),
        }
    }

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool, DomError> {
        if self.lookup(element).is_none() {
            return Ok(false);
        }
        if self.attr_of(element, "disabled").await?.is_some() {
            return Ok(false);
        }
        Ok(self
            .attr_of(element, "aria-disabled")
            .await?
            .map(|v| v != "true")
            .unwrap_or(true))
    }

    async fn buttons(&self, root: Option<&ElementRef>) -> Result<Vec<ElementRef>, DomError> {
        match root {
            None => self.find_css_all("button").await,
            Some(root) => {
                let Some(root) = self.lookup(root) else {
                    return Ok(Vec::new());
                };
                match root.find_elements("button").await {
                    Ok(elements) => Ok(elements
                        .into_iter()
                        .map(|element| self.remember(element))
                        .collect()),
                    Err(err) if is_miss(&err) => Ok(Vec::new()),
                    Err(err) => Err(DomError::CdpIo(err.to_string())),
                }
            }
        }
    }

    async fn page_source(&self) -> Result<String, DomError> {
        self.page
            .content()
            .await
            .map_err(|err| DomError::CdpIo(err.to_string()))
    }
}

/// Lookup failures that mean "the node is gone", not "the protocol broke".
fn is_miss(err: &CdpError) -> bool {
    if matches!(err, CdpError::NotFound) {
        return true;
    }
    let msg = err.to_string().to_lowercase();
    msg.contains("could not find node")
        || msg.contains("no node with given id")
        || msg.contains("node with given id does not belong")
}

fn is_not_interactable(err: &CdpError) -> bool {
    if matches!(err, CdpError::ScrollingFailed(_)) {
        return true;
    }
    let msg = err.to_string().to_lowercase();
    msg.contains("not clickable")
        || msg.contains("not visible")
        || msg.contains("box model")
        || msg.contains("detached")
}
