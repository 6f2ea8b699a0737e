// src/browser/webdriver.rs
// =============================================================================
// Drives a real browser through a W3C WebDriver server.
//
// WebDriver is plain HTTP + JSON, so reqwest and serde_json are all we need:
//   POST   /session                               -> start a browser
//   POST   /session/{id}/url                      -> navigate
//   POST   /session/{id}/elements                 -> find by CSS selector
//   GET    /session/{id}/element/{el}/displayed   -> visibility
//   GET    /session/{id}/element/{el}/screenshot  -> base64 PNG
//   DELETE /session/{id}                          -> close the browser
//
// Start geckodriver (or chromedriver) yourself and pass its address with
// --webdriver http://localhost:4444
// =============================================================================

use super::{BrowserDriver, BrowserError, BrowserSession, ElementHandle, WindowRect};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;

// The magic key W3C uses for element references in JSON
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

// How long element lookups wait for late elements to appear
const IMPLICIT_WAIT_MS: u64 = 2000;

/// Starts one browser per session on a WebDriver server.
pub struct WebDriverDriver {
    client: Client,
    endpoint: String,
}

impl WebDriverDriver {
    pub fn new(endpoint: &str) -> Result<Self, BrowserError> {
        let client = Client::builder()
            // Page loads can be slow, the server enforces its own page timeout
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Deserialize)]
struct Reply {
    value: Value,
}

#[derive(Deserialize)]
struct NewSession {
    #[serde(rename = "sessionId")]
    session_id: String,
}

// Sends one WebDriver command and unwraps the `value` field of the reply
async fn command(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> Result<Value, BrowserError> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await?;
    let status = response.status();
    let reply: Reply = response.json().await?;

    if status.is_success() {
        Ok(reply.value)
    } else {
        Err(protocol_error(&reply.value))
    }
}

// Maps the W3C error codes we care about onto BrowserError
fn protocol_error(value: &Value) -> BrowserError {
    let code = value.get("error").and_then(Value::as_str).unwrap_or("unknown error");
    let message = value.get("message").and_then(Value::as_str).unwrap_or("");

    match code {
        "element not interactable" => BrowserError::NotInteractable,
        "stale element reference" | "no such element" => {
            BrowserError::StaleElement(message.to_string())
        }
        "invalid selector" => BrowserError::InvalidSelector(message.to_string()),
        _ => BrowserError::Protocol(format!("{code}: {message}")),
    }
}

#[async_trait]
impl BrowserDriver for WebDriverDriver {
    async fn start_session(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let value = command(
            &self.client,
            Method::POST,
            &format!("{}/session", self.endpoint),
            Some(json!({ "capabilities": { "alwaysMatch": {} } })),
        )
        .await?;

        let NewSession { session_id } = serde_json::from_value(value)
            .map_err(|e| BrowserError::Protocol(format!("bad new session reply: {e}")))?;

        let mut session = WebDriverSession {
            client: self.client.clone(),
            base: format!("{}/session/{}", self.endpoint, session_id),
            closed: false,
        };

        let timeouts = session
            .post(&session.url("/timeouts"), json!({ "implicit": IMPLICIT_WAIT_MS }))
            .await;
        if let Err(e) = timeouts {
            // The browser is already running on the server, don't leave it there
            if let Err(quit_error) = session.quit().await {
                tracing::warn!(
                    session = %session_id,
                    error = %quit_error,
                    "failed to close half-started session"
                );
            }
            return Err(e);
        }

        tracing::debug!(session = %session_id, "started webdriver session");
        Ok(Box::new(session))
    }
}

struct WebDriverSession {
    client: Client,
    base: String,
    closed: bool,
}

impl WebDriverSession {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn element_url(&self, element: &ElementHandle, path: &str) -> String {
        format!("{}/element/{}{}", self.base, element.0, path)
    }

    async fn get(&self, url: &str) -> Result<Value, BrowserError> {
        command(&self.client, Method::GET, url, None).await
    }

    async fn post(&self, url: &str, body: Value) -> Result<Value, BrowserError> {
        command(&self.client, Method::POST, url, Some(body)).await
    }
}

fn expect_bool(value: Value) -> Result<bool, BrowserError> {
    value
        .as_bool()
        .ok_or_else(|| BrowserError::Protocol(format!("expected a boolean, got {value}")))
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn load(&mut self, url: &str) -> Result<(), BrowserError> {
        self.post(&self.url("/url"), json!({ "url": url }))
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        match self.get(&self.url("/url")).await? {
            Value::String(url) => Ok(url),
            other => Err(BrowserError::Protocol(format!("expected a URL, got {other}"))),
        }
    }

    async fn find_elements(&mut self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError> {
        let value = self
            .post(
                &self.url("/elements"),
                json!({ "using": "css selector", "value": selector }),
            )
            .await?;

        let handles: Vec<ElementHandle> = value
            .as_array()
            .map(|found| {
                found
                    .iter()
                    .filter_map(|reference| reference.get(ELEMENT_KEY))
                    .filter_map(Value::as_str)
                    .map(|id| ElementHandle(id.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(handles)
    }

    async fn is_displayed(&mut self, element: &ElementHandle) -> Result<bool, BrowserError> {
        expect_bool(self.get(&self.element_url(element, "/displayed")).await?)
    }

    async fn is_enabled(&mut self, element: &ElementHandle) -> Result<bool, BrowserError> {
        expect_bool(self.get(&self.element_url(element, "/enabled")).await?)
    }

    async fn attribute(
        &mut self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        let value = self
            .get(&self.element_url(element, &format!("/attribute/{name}")))
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn scroll_into_view(&mut self, element: &ElementHandle) -> Result<(), BrowserError> {
        self.post(
            &self.url("/execute/sync"),
            json!({
                "script": "arguments[0].scrollIntoView(true);",
                "args": [{ ELEMENT_KEY: element.0 }],
            }),
        )
        .await?;
        Ok(())
    }

    async fn screenshot(
        &mut self,
        element: &ElementHandle,
        path: &Path,
    ) -> Result<(), BrowserError> {
        let value = self.get(&self.element_url(element, "/screenshot")).await?;
        let encoded = value.as_str().ok_or_else(|| {
            BrowserError::Protocol("screenshot reply was not a string".to_string())
        })?;
        let png = STANDARD
            .decode(encoded)
            .map_err(|e| BrowserError::Protocol(format!("screenshot was not base64: {e}")))?;

        tokio::fs::write(path, png).await?;
        Ok(())
    }

    async fn set_window_rect(&mut self, rect: WindowRect) -> Result<(), BrowserError> {
        self.post(
            &self.url("/window/rect"),
            json!({
                "x": rect.x,
                "y": rect.y,
                "width": rect.width,
                "height": rect.height,
            }),
        )
        .await?;
        Ok(())
    }

    async fn quit(&mut self) -> Result<(), BrowserError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        command(&self.client, Method::DELETE, &self.base, None).await?;
        Ok(())
    }
}
