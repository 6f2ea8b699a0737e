// src/checker/links.rs
// =============================================================================
// This module collects the links on the current page that we may crawl into.
//
// We keep a link only if:
// - it resolves to an http:// or https:// URL
// - it has the same origin (scheme + host + port) as the page it's on
//
// The origin is taken from the page as the browser actually shows it, after
// redirects, not from the member's registry URL.
//
// Rust concepts:
// - HashSet::insert returns false for duplicates, handy for dedup-in-order
// - Option combinators: chaining fallible steps without nested matches
// =============================================================================

use crate::browser::{BrowserError, BrowserSession};
use std::collections::HashSet;
use url::Url;

// Harvests same-origin links from the page currently loaded in `session`
//
// Returns: absolute URLs, deduplicated, in the order they appear on the page
//
// Example:
//   page = "https://alice.example/"
//   <a href="/links">, <a href="https://bob.example/">, <a href="/links#top">
//   result = ["https://alice.example/links"]
pub async fn harvest_links(
    session: &mut dyn BrowserSession,
) -> Result<Vec<String>, BrowserError> {
    let page_url = session.current_url().await?;

    let base = match Url::parse(&page_url) {
        Ok(url) => url,
        Err(e) => {
            // about:blank, data: pages and friends have nothing to crawl
            tracing::debug!(page = %page_url, error = %e, "page URL not crawlable");
            return Ok(Vec::new());
        }
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in session.find_elements("a[href]").await? {
        let Some(href) = session.attribute(&anchor, "href").await? else {
            continue;
        };

        if let Some(link) = same_origin_link(&base, &href) {
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }
    }

    Ok(links)
}

// Resolves `href` against the page and keeps it only if it stays on the
// page's origin
//
// Fragments are dropped: "/page#a" and "/page#b" are the same page.
pub(crate) fn same_origin_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    let mut url = base.join(href).ok()?;

    if !matches!(url.scheme(), "http" | "https") || url.origin() != base.origin() {
        return None;
    }

    url.set_fragment(None);
    Some(url.to_string())
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why url.origin() and not just the host?
//    - https://alice.example and http://alice.example are different origins
//    - So are alice.example:8080 and alice.example
//    - origin() compares scheme, host and port together
//
// 2. Why does base.join() handle absolute links too?
//    - join() follows the same rules as a browser resolving an href
//    - An absolute href simply replaces the base
//    - A relative one ("../about") is resolved against the page
//
// 3. What is let-else?
//    - let Some(x) = expr else { continue; };
//    - Binds x when the pattern matches, otherwise runs the else block
//    - The else block must leave the scope (continue, return, break...)
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakeWeb;

    fn base() -> Url {
        Url::parse("https://alice.example/home/").unwrap()
    }

    #[test]
    fn test_resolve_relative_link() {
        assert_eq!(
            same_origin_link(&base(), "../links"),
            Some("https://alice.example/links".to_string())
        );
    }

    #[test]
    fn test_skip_other_origin() {
        assert_eq!(same_origin_link(&base(), "https://bob.example/"), None);
        assert_eq!(same_origin_link(&base(), "http://alice.example/"), None);
        assert_eq!(same_origin_link(&base(), "https://alice.example:8443/"), None);
    }

    #[test]
    fn test_skip_non_http() {
        assert_eq!(same_origin_link(&base(), "mailto:alice@alice.example"), None);
        assert_eq!(same_origin_link(&base(), "javascript:void(0)"), None);
        assert_eq!(same_origin_link(&base(), "#top"), None);
    }

    #[test]
    fn test_fragment_is_dropped() {
        assert_eq!(
            same_origin_link(&base(), "/about#me"),
            Some("https://alice.example/about".to_string())
        );
    }

    #[tokio::test]
    async fn test_harvest_dedups_in_page_order() {
        let html = r#"
            <a href="/webring">ring</a>
            <a href="https://bob.example/">bob</a>
            <a href="about">about</a>
            <a href="/webring#footer">ring again</a>
            <a>no href</a>
        "#;
        let web = FakeWeb::new().page("https://alice.example/home/", html);
        let mut session = web.session();
        session.load("https://alice.example/home/").await.unwrap();

        let links = harvest_links(&mut session).await.unwrap();
        assert_eq!(
            links,
            vec![
                "https://alice.example/webring",
                "https://alice.example/home/about",
            ]
        );
    }

    #[tokio::test]
    async fn test_origin_follows_redirects() {
        let web = FakeWeb::new()
            .redirect("https://alice.example/", "https://alice.blog.example/")
            .page(
                "https://alice.blog.example/",
                r#"<a href="/links">l</a><a href="https://alice.example/old">o</a>"#,
            );
        let mut session = web.session();
        session.load("https://alice.example/").await.unwrap();

        let links = harvest_links(&mut session).await.unwrap();
        assert_eq!(links, vec!["https://alice.blog.example/links"]);
    }
}
