// src/crawl/site.rs
// =============================================================================
// This module searches one member's site for ring evidence.
//
// How it works (depth-first):
// 1. Start with the member's home page on a stack
// 2. Pop a page; skip it if we've already visited it (cycle guard)
// 3. Mark it visited, load it, run the evidence detector
// 4. Evidence found -> done, the member is valid
// 5. Otherwise harvest its links, let the planner order them, and push
//    them so the best candidate is popped next
// 6. Stack empty -> done, the member is invalid
//
// Two limits keep link-dense sites in check:
// - max_depth: how many links away from the home page we go
// - max_pages: how many pages we load in total
// With OnLimit::Fail, hitting a limit while pages were left over turns the
// whole crawl into an error instead.
//
// Rust concepts:
// - Vec as a stack: push() and pop() both work on the end
// - HashSet: O(1) "have we seen this URL?" checks
// - anyhow::bail!: return an error early with a formatted message
// =============================================================================

use crate::browser::BrowserSession;
use crate::checker::{detect, harvest_links, ScreenshotStore};
use crate::config::{CheckerConfig, OnLimit};
use anyhow::{bail, Result};
use std::collections::HashSet;
use url::Url;

// A page waiting to be visited
#[derive(Debug, Clone)]
struct CrawlItem {
    url: String,
    depth: usize, // How many links away from the home page
}

/// How a crawl that didn't blow up ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// Evidence was found on this page (as shown by the browser)
    Found { page: String },
    /// Every reachable page within the limits was checked
    Exhausted,
}

/// Crawls one member's site. Owns its visited set, borrows its session.
pub struct SiteCrawler<'a> {
    session: &'a mut dyn BrowserSession,
    member_name: &'a str,
    config: &'a CheckerConfig,
    screenshots: ScreenshotStore,
    visited: HashSet<String>,
}

impl<'a> SiteCrawler<'a> {
    pub fn new(
        session: &'a mut dyn BrowserSession,
        member_name: &'a str,
        config: &'a CheckerConfig,
    ) -> Self {
        Self {
            session,
            member_name,
            config,
            screenshots: ScreenshotStore::new(config.screenshot_dir.clone()),
            visited: HashSet::new(),
        }
    }

    /// URLs loaded so far, in no particular order
    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    pub async fn crawl(&mut self, start_url: &str) -> Result<CrawlOutcome> {
        let limits = self.config.limits;
        let mut loaded = 0;
        let mut stack = vec![CrawlItem {
            url: normalize_start(start_url),
            depth: 0,
        }];

        while let Some(item) = stack.pop() {
            // Cycle guard: a URL is visited at most once per crawl
            if self.visited.contains(&item.url) {
                continue;
            }

            if let Some(max_pages) = limits.max_pages {
                if loaded >= max_pages {
                    if limits.on_limit == OnLimit::Fail {
                        bail!("traversal limit exceeded: {} pages visited", max_pages);
                    }
                    tracing::debug!(member = %self.member_name, max_pages, "page budget spent");
                    break;
                }
            }

            // Marked before loading so a page that fails can't be retried
            self.visited.insert(item.url.clone());
            tracing::debug!(
                member = %self.member_name,
                url = %item.url,
                depth = item.depth,
                "visiting"
            );
            self.session.load(&item.url).await?;
            loaded += 1;

            // Where the browser ended up counts as visited too, so a
            // redirect target linked from its own page isn't loaded again
            let landed = self.session.current_url().await?;
            if landed != item.url {
                self.visited.insert(landed);
            }

            if detect(
                &mut *self.session,
                self.member_name,
                &self.config.webring,
                &self.screenshots,
            )
            .await?
            {
                let page = self.session.current_url().await?;
                return Ok(CrawlOutcome::Found { page });
            }

            let links = self.config.planner.plan(harvest_links(&mut *self.session).await?);
            let unvisited: Vec<String> = links
                .into_iter()
                .filter(|link| !self.visited.contains(link))
                .collect();

            if item.depth >= limits.max_depth {
                if !unvisited.is_empty() && limits.on_limit == OnLimit::Fail {
                    bail!(
                        "traversal limit exceeded: {} links left at depth {}",
                        unvisited.len(),
                        item.depth
                    );
                }
                continue;
            }

            tracing::debug!(
                member = %self.member_name,
                url = %item.url,
                links = unvisited.len(),
                "queueing sub-pages"
            );

            // Reversed so the planner's first choice is popped first
            stack.extend(unvisited.into_iter().rev().map(|url| CrawlItem {
                url,
                depth: item.depth + 1,
            }));
        }

        Ok(CrawlOutcome::Exhausted)
    }
}

// Registry URLs are written by hand: "https://a.example" must be the same
// page as the "https://a.example/" that harvested links resolve to
fn normalize_start(start_url: &str) -> String {
    match Url::parse(start_url.trim()) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => start_url.to_string(),
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why a stack instead of recursion?
//    - Recursive async fns need boxing, and deep recursion can overflow
//    - An explicit Vec gives the same depth-first, left-to-right order:
//      children are pushed in reverse, so the first child is popped first
//    - The visited check happens when a page is popped, exactly where a
//      recursive version would check it on entry
//
// 2. Why &mut *self.session?
//    - self.session is a &mut dyn BrowserSession stored in the struct
//    - Passing it to a function would move the reference out of self
//    - &mut *self.session "reborrows" it for just that call
//
// 3. Why is `limits` copied into a local?
//    - CrawlLimits is Copy, so this is free
//    - It keeps the loop body from borrowing self.config over and over
// -----------------------------------------------------------------------------
