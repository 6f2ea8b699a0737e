// src/crawl/mod.rs
// =============================================================================
// This module handles crawling a member's site for ring evidence.
//
// Features:
// - Depth-first search from the member's home page
// - Link ordering by keyword (ring/link pages first, blog posts skipped)
// - Same-origin restriction (never wanders off the member's site)
// - Configurable depth and page limits
// - Liveness pre-check so dead sites never cost a browser session
//
// Submodules:
// - planner: orders and filters candidate links
// - site: the crawl itself, for one member and one browser session
// - member: liveness check + session lifecycle + crawl -> CrawlResult
// =============================================================================

mod member;
mod planner;
mod site;

pub use member::check_member;
pub use planner::CrawlPlanner;
