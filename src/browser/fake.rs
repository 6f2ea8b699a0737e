// src/browser/fake.rs
// =============================================================================
// An in-memory "web" for tests.
//
// Pages are HTML strings keyed by URL. Sessions use the same element
// selection code as the static HTML session, so tests exercise the real
// visibility rules. Every load, session start, quit and window move is
// counted so tests can assert on what the crawler actually did.
// =============================================================================

use super::static_html::{lookup, register, select_elements, StaticElement};
use super::{BrowserDriver, BrowserError, BrowserSession, ElementHandle, WindowRect};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeState {
    pages: HashMap<String, String>,
    redirects: HashMap<String, String>,
    failing: HashSet<String>,
    panicking: HashSet<String>,
    loads: Mutex<Vec<String>>,
    sessions_started: Mutex<usize>,
    sessions_quit: Mutex<usize>,
    window_rects: Mutex<Vec<WindowRect>>,
}

#[derive(Default, Clone)]
pub struct FakeWeb {
    state: Arc<FakeState>,
}

impl FakeWeb {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_mut(&mut self) -> &mut FakeState {
        Arc::get_mut(&mut self.state).expect("configure FakeWeb before sharing it")
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.state_mut().pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Loading `from` ends up on `to`, like an HTTP redirect.
    pub fn redirect(mut self, from: &str, to: &str) -> Self {
        self.state_mut().redirects.insert(from.to_string(), to.to_string());
        self
    }

    /// Loading `url` fails with a navigation error.
    pub fn failing(mut self, url: &str) -> Self {
        self.state_mut().failing.insert(url.to_string());
        self
    }

    /// Loading `url` panics, like a driver bug would.
    pub fn panicking(mut self, url: &str) -> Self {
        self.state_mut().panicking.insert(url.to_string());
        self
    }

    pub fn loads(&self) -> Vec<String> {
        self.state.loads.lock().unwrap().clone()
    }

    pub fn sessions_started(&self) -> usize {
        *self.state.sessions_started.lock().unwrap()
    }

    pub fn sessions_quit(&self) -> usize {
        *self.state.sessions_quit.lock().unwrap()
    }

    pub fn window_rects(&self) -> Vec<WindowRect> {
        self.state.window_rects.lock().unwrap().clone()
    }

    pub fn session(&self) -> FakeSession {
        FakeSession {
            state: self.state.clone(),
            current_url: None,
            html: String::new(),
            elements: Vec::new(),
        }
    }
}

#[async_trait]
impl BrowserDriver for FakeWeb {
    async fn start_session(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        *self.state.sessions_started.lock().unwrap() += 1;
        Ok(Box::new(self.session()))
    }
}

pub struct FakeSession {
    state: Arc<FakeState>,
    current_url: Option<String>,
    html: String,
    elements: Vec<StaticElement>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn load(&mut self, url: &str) -> Result<(), BrowserError> {
        self.state.loads.lock().unwrap().push(url.to_string());

        if self.state.panicking.contains(url) {
            panic!("driver crashed loading {}", url);
        }
        if self.state.failing.contains(url) {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: "connection reset".to_string(),
            });
        }

        let landed = self
            .state
            .redirects
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string());
        let html = self.state.pages.get(&landed).cloned().unwrap_or_default();

        self.current_url = Some(landed);
        self.html = html;
        self.elements.clear();
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        self.current_url.clone().ok_or(BrowserError::NoPage)
    }

    async fn find_elements(&mut self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError> {
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
        lookup(&self.elements, element).map(|_| ())
    }

    async fn screenshot(
        &mut self,
        element: &ElementHandle,
        path: &Path,
    ) -> Result<(), BrowserError> {
        lookup(&self.elements, element)?;
        std::fs::write(path, b"\x89PNG fake")?;
        Ok(())
    }

    async fn set_window_rect(&mut self, rect: WindowRect) -> Result<(), BrowserError> {
        self.state.window_rects.lock().unwrap().push(rect);
        Ok(())
    }

    async fn quit(&mut self) -> Result<(), BrowserError> {
        *self.state.sessions_quit.lock().unwrap() += 1;
        Ok(())
    }
}
