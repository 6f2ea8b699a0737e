// src/browser/static_html.rs
// =============================================================================
// A browser session that doesn't run a browser.
//
// Pages are downloaded with reqwest and parsed with scraper. This is enough
// for the vast majority of webring member sites, which are hand-written
// static HTML. It can't run JavaScript and it can't take pixel screenshots,
// but it needs nothing installed besides this binary.
//
// "Visible" is approximated from the markup:
// - the element and all its ancestors lack the `hidden` attribute
// - no inline style says display:none or visibility:hidden
// - it isn't an <input type="hidden">
// "Enabled" means there is no `disabled` attribute.
// =============================================================================

use super::{BrowserDriver, BrowserError, BrowserSession, ElementHandle, WindowRect};
use async_trait::async_trait;
use reqwest::Client;
use scraper::node::Element;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Starts [`StaticHtmlSession`]s that share one connection pool.
pub struct StaticHtmlDriver {
    client: Client,
}

impl StaticHtmlDriver {
    pub fn new() -> Result<Self, BrowserError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!("webring-checker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl BrowserDriver for StaticHtmlDriver {
    async fn start_session(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        // Client is reference counted internally, cloning is cheap
        Ok(Box::new(StaticHtmlSession::new(self.client.clone())))
    }
}

// What we remember about an element after a selector matched it
//
// scraper's Html isn't Send, so we can't keep the parsed document around
// inside an async session. Instead we keep the HTML text and take a small
// snapshot of every element handed out.
#[derive(Debug, Clone)]
pub(crate) struct StaticElement {
    pub attrs: HashMap<String, String>,
    pub displayed: bool,
    pub enabled: bool,
}

/// Runs `selector` against `html` and snapshots every match in document order.
pub(crate) fn select_elements(
    html: &str,
    selector: &str,
) -> Result<Vec<StaticElement>, BrowserError> {
    let selector =
        Selector::parse(selector).map_err(|_| BrowserError::InvalidSelector(selector.to_string()))?;
    let document = Html::parse_document(html);

    let elements = document
        .select(&selector)
        .map(|element| StaticElement {
            attrs: element
                .value()
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            displayed: is_displayed(element),
            enabled: element.value().attr("disabled").is_none(),
        })
        .collect();

    Ok(elements)
}

fn is_displayed(element: ElementRef) -> bool {
    if hides_itself(element.value()) {
        return false;
    }

    // Any hidden ancestor hides the whole subtree
    !element
        .ancestors()
        .filter_map(|node| node.value().as_element())
        .any(hides_itself)
}

fn hides_itself(element: &Element) -> bool {
    if element.attr("hidden").is_some() {
        return true;
    }

    if element.name() == "input"
        && element
            .attr("type")
            .is_some_and(|kind| kind.eq_ignore_ascii_case("hidden"))
    {
        return true;
    }

    match element.attr("style") {
        Some(style) => {
            let style: String = style
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase();
            style.contains("display:none") || style.contains("visibility:hidden")
        }
        None => false,
    }
}

// Session state: the current page and the elements handed out for it
pub(crate) struct StaticHtmlSession {
    client: Client,
    current_url: Option<String>,
    html: String,
    elements: Vec<StaticElement>,
}

impl StaticHtmlSession {
    fn new(client: Client) -> Self {
        Self {
            client,
            current_url: None,
            html: String::new(),
            elements: Vec::new(),
        }
    }
}

/// Stores a batch of snapshots and returns handles pointing at them.
///
/// Handles are indexes into `arena`, so they stay valid until the arena is
/// cleared by the next page load.
pub(crate) fn register(
    arena: &mut Vec<StaticElement>,
    found: Vec<StaticElement>,
) -> Vec<ElementHandle> {
    let start = arena.len();
    arena.extend(found);
    (start..arena.len())
        .map(|index| ElementHandle(index.to_string()))
        .collect()
}

pub(crate) fn lookup<'a>(
    arena: &'a [StaticElement],
    handle: &ElementHandle,
) -> Result<&'a StaticElement, BrowserError> {
    handle
        .0
        .parse::<usize>()
        .ok()
        .and_then(|index| arena.get(index))
        .ok_or_else(|| BrowserError::StaleElement(handle.0.clone()))
}

#[async_trait]
impl BrowserSession for StaticHtmlSession {
    async fn load(&mut self, url: &str) -> Result<(), BrowserError> {
        let navigation_error = |e: reqwest::Error| BrowserError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        };

        // Like a real browser we render error pages too, only transport
        // failures count as a failed load
        let response = self.client.get(url).send().await.map_err(navigation_error)?;
        let final_url = response.url().to_string();
        let html = response.text().await.map_err(navigation_error)?;

        self.current_url = Some(final_url);
        self.html = html;
        self.elements.clear();
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        self.current_url.clone().ok_or(BrowserError::NoPage)
    }

    async fn find_elements(&mut self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError> {
        if self.current_url.is_none() {
            return Err(BrowserError::NoPage);
        }
        let found = select_elements(&self.html, selector)?;
        Ok(register(&mut self.elements, found))
    }

    async fn is_displayed(&mut self, element: &ElementHandle) -> Result<bool, BrowserError> {
        Ok(lookup(&self.elements, element)?.displayed)
    }

    async fn is_enabled(&mut self, element: &ElementHandle) -> Result<bool, BrowserError> {
        Ok(lookup(&self.elements, element)?.enabled)
    }

    async fn attribute(
        &mut self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        Ok(lookup(&self.elements, element)?.attrs.get(name).cloned())
    }

    async fn scroll_into_view(&mut self, element: &ElementHandle) -> Result<(), BrowserError> {
        // Nothing to scroll, but the handle should still be ours
        lookup(&self.elements, element).map(|_| ())
    }

    async fn screenshot(
        &mut self,
        _element: &ElementHandle,
        _path: &Path,
    ) -> Result<(), BrowserError> {
        Err(BrowserError::Unsupported("element screenshots"))
    }

    async fn set_window_rect(&mut self, _rect: WindowRect) -> Result<(), BrowserError> {
        // There is no window
        Ok(())
    }

    async fn quit(&mut self) -> Result<(), BrowserError> {
        self.current_url = None;
        self.html.clear();
        self.elements.clear();
        Ok(())
    }
}
