// src/checker/liveness.rs
// =============================================================================
// This module does the cheap "is this site even up?" check.
//
// Before starting a browser session for a member we send one HEAD request
// to its home page:
// - 4xx / 5xx        -> the member is recorded as "Error: <status>" right away
// - anything else    -> go ahead with the real crawl
// - no answer at all -> we don't know, go ahead with the real crawl anyway
//
// Rust concepts:
// - Traits: LivenessProbe lets tests swap in scripted answers
// - Enums with data: Liveness::Status(u16) carries the status code
// =============================================================================

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Answer of a liveness check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Liveness {
    /// The server answered with this HTTP status
    Status(u16),
    /// No HTTP answer (DNS failure, refused connection, timeout...)
    Unreachable(String),
}

impl Liveness {
    /// The status code when it means the site is broken (>= 400)
    pub fn failure_status(&self) -> Option<u16> {
        match self {
            Liveness::Status(code) if *code >= 400 => Some(*code),
            _ => None,
        }
    }
}

#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Liveness;
}

/// Liveness check over real HTTP
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10)) // 10 second timeout per request
            .redirect(reqwest::redirect::Policy::limited(5)) // Follow up to 5 redirects
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl LivenessProbe for HttpProbe {
    async fn probe(&self, url: &str) -> Liveness {
        // HEAD is enough, we only care about the status line
        match self.client.head(url).send().await {
            Ok(response) => Liveness::Status(response.status().as_u16()),
            Err(e) => Liveness::Unreachable(e.to_string()),
        }
    }
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted liveness answers, `200` for any URL not listed
    #[derive(Default)]
    pub struct FakeProbe {
        answers: HashMap<String, Liveness>,
        pub probed: Mutex<Vec<String>>,
    }

    impl FakeProbe {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn answer(mut self, url: &str, liveness: Liveness) -> Self {
            self.answers.insert(url.to_string(), liveness);
            self
        }
    }

    #[async_trait]
    impl LivenessProbe for FakeProbe {
        async fn probe(&self, url: &str) -> Liveness {
            self.probed.lock().unwrap().push(url.to_string());
            self.answers
                .get(url)
                .cloned()
                .unwrap_or(Liveness::Status(200))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_status() {
        assert_eq!(Liveness::Status(404).failure_status(), Some(404));
        assert_eq!(Liveness::Status(503).failure_status(), Some(503));
        assert_eq!(Liveness::Status(200).failure_status(), None);
        assert_eq!(Liveness::Status(301).failure_status(), None);
        assert_eq!(
            Liveness::Unreachable("dns error".to_string()).failure_status(),
            None
        );
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let probe = HttpProbe::new().unwrap();
        // Port 9 (discard) on localhost is closed on any sane machine
        let liveness = probe.probe("http://127.0.0.1:9/").await;
        assert!(matches!(liveness, Liveness::Unreachable(_)));
    }
}
