// src/checker/screenshots.rs
// =============================================================================
// Saves a picture of every piece of evidence we find.
//
// Files are named "<member>-<what>.png", e.g. "alice-prev.png" or
// "alice-embed-dark.png", inside the screenshot directory. The directory is
// created the first time something is saved.
//
// A screenshot that fails (unsupported by the session, disk full...) is
// logged and forgotten: evidence is evidence even without a picture.
// =============================================================================

use crate::browser::{BrowserSession, ElementHandle};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ScreenshotStore {
    dir: PathBuf,
}

impl ScreenshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, member_name: &str, label: &str) -> PathBuf {
        self.dir
            .join(format!("{}-{}.png", file_stem(member_name), label))
    }

    /// Scrolls `element` into view and saves it. Never fails the caller.
    pub async fn capture(
        &self,
        session: &mut dyn BrowserSession,
        element: &ElementHandle,
        member_name: &str,
        label: &str,
    ) -> Option<PathBuf> {
        let path = self.path_for(member_name, label);

        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            tracing::warn!(
                dir = %self.dir.display(),
                error = %e,
                "cannot create screenshot directory"
            );
            return None;
        }

        if let Err(e) = session.scroll_into_view(element).await {
            tracing::warn!(
                member = %member_name,
                error = %e,
                "could not scroll evidence into view"
            );
        }

        match session.screenshot(element, &path).await {
            Ok(()) => {
                tracing::info!(member = %member_name, path = %path.display(), "screenshot saved");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(member = %member_name, label, error = %e, "screenshot skipped");
                None
            }
        }
    }
}

// Member names come straight from the registry. Undo any percent-encoding
// and keep them from escaping the screenshot directory.
fn file_stem(member_name: &str) -> String {
    let decoded = urlencoding::decode(member_name)
        .map(|name| name.into_owned())
        .unwrap_or_else(|_| member_name.to_string());

    let stem: String = decoded
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match stem.trim_matches('.') {
        "" => "member".to_string(),
        _ => stem,
    }
}
