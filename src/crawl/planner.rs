// src/crawl/planner.rs
// =============================================================================
// Decides which harvested links are worth visiting, and in what order.
//
// Ring links are usually on a "links" or "webring" page, almost never in a
// blog post. So links are sorted into three groups by keywords found in
// their path:
//   1. priority  - mentions "webring", "ring" or "link"      -> visited first
//   2. ignored   - mentions "blog", "note", "comic"... only  -> dropped
//   3. the rest                                              -> visited after
//
// Within a group the page order is kept.
//
// Keywords are matched against the path and query only, never the host.
// Matching the whole URL would put every link of ringo.example in the
// priority group and drop every link of notes.example.
// =============================================================================

use url::Url;

const PRIORITY_WORDS: [&str; 3] = ["webring", "ring", "link"];
const IGNORED_WORDS: [&str; 6] = ["blog", "updates", "talk", "thought", "note", "comic"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkClass {
    Priority,
    Ignored,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlPlanner {
    priority_words: Vec<String>,
    ignored_words: Vec<String>,
}

impl Default for CrawlPlanner {
    fn default() -> Self {
        Self::new(PRIORITY_WORDS, IGNORED_WORDS)
    }
}

impl CrawlPlanner {
    pub fn new<P, I>(priority_words: P, ignored_words: I) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self {
            priority_words: priority_words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
            ignored_words: ignored_words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Orders candidate links: priority links first, then the rest.
    /// Links that only look like noise are dropped.
    pub fn plan(&self, links: Vec<String>) -> Vec<String> {
        let mut priority = Vec::new();
        let mut normal = Vec::new();

        for link in links {
            match self.classify(&link) {
                LinkClass::Priority => priority.push(link),
                LinkClass::Normal => normal.push(link),
                LinkClass::Ignored => tracing::trace!(link = %link, "skipping link"),
            }
        }

        priority.extend(normal);
        priority
    }

    fn classify(&self, link: &str) -> LinkClass {
        let haystack = keyword_haystack(link);
        let mentions = |words: &[String]| words.iter().any(|word| haystack.contains(word.as_str()));

        if mentions(&self.priority_words) {
            LinkClass::Priority
        } else if mentions(&self.ignored_words) {
            LinkClass::Ignored
        } else {
            LinkClass::Normal
        }
    }
}

// The part of a link keywords are matched against: everything after the
// origin, lowercased. A member hosted at notes.example shouldn't have all
// its links thrown away.
fn keyword_haystack(link: &str) -> String {
    match Url::parse(link) {
        Ok(url) => {
            let mut tail = url.path().to_string();
            if let Some(query) = url.query() {
                tail.push('?');
                tail.push_str(query);
            }
            tail.to_lowercase()
        }
        Err(_) => link.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_priority_first_ignored_dropped() {
        let planned = CrawlPlanner::default().plan(links(&[
            "https://x/blog/1",
            "https://x/webring",
            "https://x/about",
        ]));
        assert_eq!(planned, vec!["https://x/webring", "https://x/about"]);
    }

    #[test]
    fn test_priority_wins_over_ignored() {
        let planned = CrawlPlanner::default().plan(links(&[
            "https://x/about",
            "https://x/blog/my-links",
        ]));
        assert_eq!(planned, vec!["https://x/blog/my-links", "https://x/about"]);
    }

    #[test]
    fn test_page_order_kept_within_group() {
        let planned = CrawlPlanner::default().plan(links(&[
            "https://x/contact",
            "https://x/Links",
            "https://x/about",
            "https://x/?page=ring",
        ]));
        assert_eq!(
            planned,
            vec![
                "https://x/Links",
                "https://x/?page=ring",
                "https://x/contact",
                "https://x/about",
            ]
        );
    }

    #[test]
    fn test_host_is_not_matched() {
        let planned = CrawlPlanner::default().plan(links(&["https://notes.example/about"]));
        assert_eq!(planned, vec!["https://notes.example/about"]);
    }

    #[test]
    fn test_ring_in_host_does_not_prioritize() {
        let planned = CrawlPlanner::default().plan(links(&[
            "https://ringo.example/about",
            "https://ringo.example/contact",
            "https://ringo.example/links",
        ]));
        assert_eq!(
            planned,
            vec![
                "https://ringo.example/links",
                "https://ringo.example/about",
                "https://ringo.example/contact",
            ]
        );
    }

    #[test]
    fn test_custom_keywords() {
        let planner = CrawlPlanner::new(["friends"], ["shop"]);
        let planned = planner.plan(links(&[
            "https://x/shop/item",
            "https://x/webring",
            "https://x/friends",
        ]));
        assert_eq!(planned, vec!["https://x/friends", "https://x/webring"]);
    }
}
