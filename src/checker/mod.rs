// src/checker/mod.rs
// =============================================================================
// This module contains everything that inspects a single page or site.
//
// Submodules:
// - evidence: decides whether a page carries the ring's links or widget
// - screenshots: saves pictures of the evidence that was found
// - links: collects same-origin links to crawl into
// - liveness: cheap HEAD request to skip dead sites early
//
// This file (mod.rs) is the module root - it ties everything together and
// exports the public API that other parts of our application can use.
// =============================================================================

mod evidence;
mod links;
mod liveness;
mod screenshots;

pub use evidence::{detect, WebringEndpoints};
pub use links::harvest_links;
pub use liveness::{HttpProbe, Liveness, LivenessProbe};
pub use screenshots::ScreenshotStore;

#[cfg(test)]
pub use liveness::fake::FakeProbe;
