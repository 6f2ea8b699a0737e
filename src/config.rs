// src/config.rs
// =============================================================================
// Runtime configuration for a check run.
//
// Everything tunable lives in one CheckerConfig value built from the
// command line. It's created once in main and shared (read-only, behind an
// Arc) with every worker. Nothing in the crate reads global state.
//
// The defaults reproduce the bucket webring's own checker:
// - 6 workers tiled 3x2 over a 1440x875 screen area
// - start page plus one level of sub-pages
// - screenshots in ./screenshots, results in ./results.json
// =============================================================================

use crate::checker::WebringEndpoints;
use crate::cli::CrawlArgs;
use crate::crawl::CrawlPlanner;
use crate::pool::WindowGrid;
use std::path::PathBuf;

pub const DEFAULT_WEBRING_BASE: &str = "https://webring.bucketfish.me";
pub const DEFAULT_WORKERS: usize = 6;
pub const DEFAULT_MAX_DEPTH: usize = 1;
pub const DEFAULT_OUTPUT: &str = "results.json";
pub const DEFAULT_SCREENSHOT_DIR: &str = "screenshots";

/// What to do when a traversal bound is reached with pages left to visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnLimit {
    /// Stop descending and judge the member on what was seen
    Prune,
    /// Record the member as an error
    Fail,
}

/// Bounds on one member's crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlLimits {
    /// Depth 0 is the start page
    pub max_depth: usize,
    /// Maximum number of pages loaded for one member
    pub max_pages: Option<usize>,
    pub on_limit: OnLimit,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_pages: None,
            on_limit: OnLimit::Prune,
        }
    }
}

/// How a previous output file is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeMode {
    /// Members already in the file are not checked again
    SkipRecorded,
    /// Every member is checked and appended, even if already recorded
    Append,
}

#[derive(Debug, Clone)]
pub struct CheckerConfig {
    pub webring: WebringEndpoints,
    pub limits: CrawlLimits,
    pub planner: CrawlPlanner,
    pub workers: usize,
    pub grid: WindowGrid,
    pub screenshot_dir: PathBuf,
    pub output: PathBuf,
    pub resume: ResumeMode,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            webring: WebringEndpoints::new(DEFAULT_WEBRING_BASE),
            limits: CrawlLimits::default(),
            planner: CrawlPlanner::default(),
            workers: DEFAULT_WORKERS,
            grid: WindowGrid::default(),
            screenshot_dir: PathBuf::from(DEFAULT_SCREENSHOT_DIR),
            output: PathBuf::from(DEFAULT_OUTPUT),
            resume: ResumeMode::SkipRecorded,
        }
    }
}

impl CheckerConfig {
    // Applies the crawl options shared by every subcommand
    pub fn from_crawl_args(args: &CrawlArgs) -> Self {
        Self {
            webring: WebringEndpoints::new(&args.webring_base),
            limits: CrawlLimits {
                max_depth: args.max_depth,
                max_pages: args.max_pages,
                on_limit: if args.fail_on_limit {
                    OnLimit::Fail
                } else {
                    OnLimit::Prune
                },
            },
            screenshot_dir: args.screenshots.clone(),
            ..Self::default()
        }
    }
}
