// src/crawl/member.rs
// =============================================================================
// Checks one member from start to finish and always produces a result.
//
// Steps:
// 1. Liveness pre-check (HEAD). A 4xx/5xx answer ends it here, no browser.
// 2. Start a browser session, move its window to this worker's grid slot
// 3. Crawl the site
// 4. Close the session, whatever happened (a panicking crawl included)
// 5. Turn the outcome (or the error) into a CrawlResult
//
// Nothing in here returns an error to the caller: every failure becomes an
// "Error: ..." status on this member and the other members carry on.
// =============================================================================

use super::site::{CrawlOutcome, SiteCrawler};
use crate::browser::{BrowserDriver, WindowRect};
use crate::checker::{Liveness, LivenessProbe};
use crate::config::CheckerConfig;
use crate::registry::MemberEntry;
use crate::report::CrawlResult;
use anyhow::anyhow;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

/// Runs the full check for one member.
///
/// `window` places the browser window on screen; `None` leaves it alone.
pub async fn check_member(
    member: &MemberEntry,
    driver: &dyn BrowserDriver,
    probe: &dyn LivenessProbe,
    config: &CheckerConfig,
    window: Option<WindowRect>,
) -> CrawlResult {
    let liveness = probe.probe(&member.url).await;
    if let Some(status) = liveness.failure_status() {
        tracing::info!(
            member = %member.name,
            url = %member.url,
            status,
            "site is down, skipping crawl"
        );
        return CrawlResult::error(member, status.to_string());
    }
    if let Liveness::Unreachable(reason) = &liveness {
        // HEAD is blocked or flaky on plenty of hosts, let the browser decide
        tracing::debug!(
            member = %member.name,
            reason = %reason,
            "liveness unknown, crawling anyway"
        );
    }

    let mut session = match driver.start_session().await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(member = %member.name, error = %e, "could not start browser session");
            return CrawlResult::error(member, e.to_string());
        }
    };

    if let Some(rect) = window {
        // Cosmetic, a window manager saying no is fine
        if let Err(e) = session.set_window_rect(rect).await {
            tracing::debug!(member = %member.name, error = %e, "could not place window");
        }
    }

    let mut crawler = SiteCrawler::new(session.as_mut(), &member.name, config);
    let crawled = AssertUnwindSafe(async {
        let outcome = crawler.crawl(&member.url).await;
        (outcome, crawler.visited().len())
    })
    .catch_unwind()
    .await;

    let (outcome, pages) = match crawled {
        Ok(crawled) => crawled,
        Err(panic) => {
            tracing::error!(member = %member.name, "crawl panicked");
            (Err(anyhow!("crawl panicked: {}", panic_message(panic.as_ref()))), 0)
        }
    };

    // Released on every path before the result is reported
    if let Err(e) = session.quit().await {
        tracing::warn!(member = %member.name, error = %e, "failed to close browser session");
    }

    let result = match outcome {
        Ok(CrawlOutcome::Found { page }) => CrawlResult::valid(member, page),
        Ok(CrawlOutcome::Exhausted) => CrawlResult::invalid(member),
        Err(e) => CrawlResult::error(member, format!("{:#}", e)),
    };

    tracing::info!(member = %member.name, status = %result.status, pages, "member checked");
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
