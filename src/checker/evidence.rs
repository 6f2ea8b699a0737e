// src/checker/evidence.rs
// =============================================================================
// This module decides whether a loaded page proves ring membership.
//
// A member passes if its page has EITHER:
// - both ring navigation links
//     <a href="{ring}/redirect.html?to=prev&name={name}">
//     <a href="{ring}/redirect.html?to=next&name={name}">
// - OR at least one of the ring's embed widgets
//     <iframe src="{ring}/embed.html?name={name}&lightmode=true">
//     <iframe src="{ring}/embed.html?name={name}&lightmode=false">
//     <iframe src="{ring}/embed.html?name={name}">
//
// An element only counts if it is displayed and enabled. Every element that
// counts gets scrolled into view and screenshotted as an audit trail.
//
// Rust concepts:
// - &mut dyn Trait: Borrow a trait object mutably for the duration of a call
// - Arrays [T; N]: Fixed-size lists when the count is known up front
// =============================================================================

use super::screenshots::ScreenshotStore;
use crate::browser::{BrowserError, BrowserSession, ElementHandle};

/// URLs of the ring's redirect and embed pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebringEndpoints {
    base: String,
}

// One thing we look for on a page
//
// `label` ends up in the screenshot file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceProbe {
    pub label: &'static str,
    pub selector: String,
}

impl WebringEndpoints {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// The prev and next navigation links. Both are required.
    pub fn redirect_probes(&self, member_name: &str) -> [EvidenceProbe; 2] {
        let name = encode_name(member_name);
        ["prev", "next"].map(|direction| EvidenceProbe {
            label: direction,
            selector: attribute_selector(
                "a",
                "href",
                &format!("{}/redirect.html?to={}&name={}", self.base, direction, name),
            ),
        })
    }

    /// The embed widget variants. Any one is enough.
    pub fn embed_probes(&self, member_name: &str) -> [EvidenceProbe; 3] {
        let name = encode_name(member_name);
        let embed = format!("{}/embed.html?name={}", self.base, name);
        [
            ("embed-light", format!("{}&lightmode=true", embed)),
            ("embed-dark", format!("{}&lightmode=false", embed)),
            ("embed", embed),
        ]
        .map(|(label, src)| EvidenceProbe {
            label,
            selector: attribute_selector("iframe", "src", &src),
        })
    }
}

// Percent-encodes a member name for the ring's query strings. '/' stays as
// is, the ring's own links are built that way.
fn encode_name(member_name: &str) -> String {
    urlencoding::encode(member_name).replace("%2F", "/")
}

// Builds `tag[attr="value"]`, matching the attribute value exactly
fn attribute_selector(tag: &str, attribute: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("{}[{}=\"{}\"]", tag, attribute, escaped)
}

/// Checks the current page for ring evidence.
///
/// All five probes are always evaluated so every usable element gets its
/// screenshot, even once the verdict is already known.
pub async fn detect(
    session: &mut dyn BrowserSession,
    member_name: &str,
    endpoints: &WebringEndpoints,
    screenshots: &ScreenshotStore,
) -> Result<bool, BrowserError> {
    let mut redirects_found = true;
    for probe in endpoints.redirect_probes(member_name) {
        if !check_probe(session, &probe, member_name, screenshots).await? {
            redirects_found = false;
        }
    }

    let mut embed_found = false;
    for probe in endpoints.embed_probes(member_name) {
        if check_probe(session, &probe, member_name, screenshots).await? {
            embed_found = true;
        }
    }

    tracing::debug!(
        member = %member_name,
        redirects = redirects_found,
        embed = embed_found,
        "evidence checked"
    );
    Ok(redirects_found || embed_found)
}

// Looks for the first usable element matching the probe
//
// Not finding anything is a normal "no", not an error
async fn check_probe(
    session: &mut dyn BrowserSession,
    probe: &EvidenceProbe,
    member_name: &str,
    screenshots: &ScreenshotStore,
) -> Result<bool, BrowserError> {
    for element in session.find_elements(&probe.selector).await? {
        if is_usable(session, &element).await? {
            screenshots
                .capture(session, &element, member_name, probe.label)
                .await;
            return Ok(true);
        }
    }
    Ok(false)
}

// Displayed and enabled. An element the driver refuses to interact with
// simply doesn't count.
async fn is_usable(
    session: &mut dyn BrowserSession,
    element: &ElementHandle,
) -> Result<bool, BrowserError> {
    let usable = async {
        let displayed = session.is_displayed(element).await?;
        Ok::<_, BrowserError>(displayed && session.is_enabled(element).await?)
    };

    match usable.await {
        Ok(usable) => Ok(usable),
        Err(BrowserError::NotInteractable) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakeWeb;

    const RING: &str = "https://ring.example";
    const PAGE: &str = "https://alice.example/";

    fn redirect(direction: &str) -> String {
        format!(
            r#"<a href="https://ring.example/redirect.html?to={}&amp;name=alice%20b">{}</a>"#,
            direction, direction
        )
    }

    async fn detect_on(html: &str) -> (bool, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let screenshots = ScreenshotStore::new(dir.path().join("shots"));
        let web = FakeWeb::new().page(PAGE, html);
        let mut session = web.session();
        session.load(PAGE).await.unwrap();

        let found = detect(&mut session, "alice b", &WebringEndpoints::new(RING), &screenshots)
            .await
            .unwrap();
        (found, dir)
    }

    #[test]
    fn test_probe_urls_are_percent_encoded() {
        let endpoints = WebringEndpoints::new("https://ring.example/");
        let [prev, next] = endpoints.redirect_probes("alice b");
        assert_eq!(
            prev.selector,
            r#"a[href="https://ring.example/redirect.html?to=prev&name=alice%20b"]"#
        );
        assert_eq!(next.label, "next");

        let embeds = endpoints.embed_probes("alice b");
        assert_eq!(
            embeds[0].selector,
            r#"iframe[src="https://ring.example/embed.html?name=alice%20b&lightmode=true"]"#
        );
        assert_eq!(
            embeds[2].selector,
            r#"iframe[src="https://ring.example/embed.html?name=alice%20b"]"#
        );
    }

    #[test]
    fn test_slash_in_name_is_not_encoded() {
        let endpoints = WebringEndpoints::new("https://ring.example");
        let [prev, _] = endpoints.redirect_probes("alice/b c");
        assert_eq!(
            prev.selector,
            r#"a[href="https://ring.example/redirect.html?to=prev&name=alice/b%20c"]"#
        );
        assert_eq!(
            endpoints.embed_probes("alice/b c")[2].selector,
            r#"iframe[src="https://ring.example/embed.html?name=alice/b%20c"]"#
        );
    }

    #[tokio::test]
    async fn test_both_redirects_pass() {
        let html = format!("{}{}", redirect("prev"), redirect("next"));
        let (found, dir) = detect_on(&html).await;
        assert!(found);
        assert!(dir.path().join("shots/alice b-prev.png").exists());
        assert!(dir.path().join("shots/alice b-next.png").exists());
    }

    #[tokio::test]
    async fn test_single_embed_passes() {
        let html = concat!(
            r#"<iframe src="https://ring.example/embed.html"#,
            r#"?name=alice%20b&amp;lightmode=false"></iframe>"#
        );
        let (found, dir) = detect_on(html).await;
        assert!(found);
        assert!(dir.path().join("shots/alice b-embed-dark.png").exists());
    }

    #[tokio::test]
    async fn test_one_redirect_is_not_enough() {
        let (found, _dir) = detect_on(&redirect("next")).await;
        assert!(!found);
    }

    #[tokio::test]
    async fn test_hidden_or_disabled_elements_do_not_count() {
        let html = format!(
            r#"<div hidden>{}</div>{}
               <iframe disabled src="https://ring.example/embed.html?name=alice%20b"></iframe>"#,
            redirect("prev"),
            redirect("next")
        );
        let (found, _dir) = detect_on(&html).await;
        assert!(!found);
    }

    #[tokio::test]
    async fn test_visible_duplicate_after_hidden_one_counts() {
        let html = format!(
            r#"<a hidden href="https://ring.example/redirect.html?to=prev&amp;name=alice%20b">x</a>
               {}{}"#,
            redirect("prev"),
            redirect("next")
        );
        let (found, _dir) = detect_on(&html).await;
        assert!(found);
    }

    #[tokio::test]
    async fn test_other_members_links_do_not_count() {
        let html = r#"
            <a href="https://ring.example/redirect.html?to=prev&amp;name=bob">prev</a>
            <a href="https://ring.example/redirect.html?to=next&amp;name=bob">next</a>
        "#;
        let (found, _dir) = detect_on(html).await;
        assert!(!found);
    }
}
