// src/browser/mod.rs
// =============================================================================
// This module is the boundary between the checker and whatever actually
// renders web pages.
//
// The crawler never talks to a concrete browser. It only sees two traits:
// - BrowserDriver: starts isolated sessions (one per member being checked)
// - BrowserSession: loads a URL, finds elements, inspects them, captures them
//
// Implementations:
// - static_html: fetches pages with reqwest and parses them with scraper
// - webdriver: drives a real browser through a W3C WebDriver server
//   (geckodriver, chromedriver, safaridriver...)
//
// Rust concepts:
// - Traits: Shared behavior that several types implement
// - Trait objects (Box<dyn Trait>): Pick the implementation at runtime
// - async-trait: Lets traits have async methods
// =============================================================================

mod static_html;
mod webdriver;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

pub use static_html::StaticHtmlDriver;
pub use webdriver::WebDriverDriver;

// Everything that can go wrong while driving a page
//
// NotInteractable is special: it means "the element exists but can't be
// used", which the evidence detector treats as a plain "no".
// Every other variant is a real failure of the crawl.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to load {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("invalid selector `{0}`")]
    InvalidSelector(String),

    #[error("element {0} is no longer attached to the page")]
    StaleElement(String),

    #[error("element not interactable")]
    NotInteractable,

    #[error("{0} is not supported by this browser session")]
    Unsupported(&'static str),

    #[error("no page has been loaded yet")]
    NoPage,

    #[error("webdriver: {0}")]
    Protocol(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Opaque reference to an element found on the currently loaded page.
///
/// Only valid for the session that produced it, and only until the next
/// `load`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub(crate) String);

/// Window position and size in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

// Starts browser sessions
//
// The driver is shared by all workers (hence Send + Sync), but every
// session it hands out is owned by exactly one worker.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn start_session(&self) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

// One isolated browser session
//
// Methods take &mut self because a session has exactly one "current page"
// and only one caller may drive it at a time.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigates to `url` and waits until the page is ready.
    async fn load(&mut self, url: &str) -> Result<(), BrowserError>;

    /// URL of the page actually shown, after redirects.
    async fn current_url(&mut self) -> Result<String, BrowserError>;

    /// All elements on the current page matching a CSS selector.
    /// No match is an empty Vec, never an error.
    async fn find_elements(&mut self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError>;

    async fn is_displayed(&mut self, element: &ElementHandle) -> Result<bool, BrowserError>;

    async fn is_enabled(&mut self, element: &ElementHandle) -> Result<bool, BrowserError>;

    async fn attribute(
        &mut self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BrowserError>;

    async fn scroll_into_view(&mut self, element: &ElementHandle) -> Result<(), BrowserError>;

    /// Saves a PNG of just this element to `path`.
    async fn screenshot(
        &mut self,
        element: &ElementHandle,
        path: &Path,
    ) -> Result<(), BrowserError>;

    async fn set_window_rect(&mut self, rect: WindowRect) -> Result<(), BrowserError>;

    /// Ends the session. The session must not be used afterwards.
    async fn quit(&mut self) -> Result<(), BrowserError>;
}
