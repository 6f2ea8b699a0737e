// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - check: verify every member in the registry, in parallel, saving results
// - site:  verify a single member and print the verdict
//
// Options that shape a crawl (depth, page budget, screenshots, which
// browser to use...) are shared by both through the flattened CrawlArgs.
// =============================================================================

use crate::config::{
    DEFAULT_MAX_DEPTH, DEFAULT_OUTPUT, DEFAULT_SCREENSHOT_DIR, DEFAULT_WEBRING_BASE,
    DEFAULT_WORKERS,
};
use crate::registry::DEFAULT_REGISTRY_URL;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "webring-checker",
    version,
    about = "Checks that webring members link back to the ring",
    long_about = "webring-checker visits every member site of a webring and looks for the ring's \
                  prev/next redirect links or its embed widget, crawling into sub-pages when the \
                  home page doesn't have them. Results are saved as they come in, so an \
                  interrupted run can be resumed."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check every member listed in the registry
    ///
    /// Example: webring-checker check --workers 4 --output results.json
    Check {
        /// Registry to check: an http(s) URL or a local JSON file
        #[arg(long, default_value = DEFAULT_REGISTRY_URL)]
        registry: String,

        /// Where results are saved (and resumed from)
        #[arg(long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Name the output results_<date>_<time>.json instead of --output
        #[arg(long, conflicts_with = "output")]
        timestamped: bool,

        /// Number of members checked at the same time
        #[arg(long, default_value_t = DEFAULT_WORKERS)]
        workers: usize,

        /// Check members again even if the output already has a result for them
        #[arg(long)]
        recrawl: bool,

        /// Print the final results as JSON instead of a table
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Check one member site
    ///
    /// Example: webring-checker site alice https://alice.example
    Site {
        /// Member name as it appears in the registry
        name: String,

        /// Member home page
        url: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        crawl: CrawlArgs,
    },
}

/// Options shared by every subcommand that crawls
#[derive(Args, Debug, Clone)]
pub struct CrawlArgs {
    /// How many links deep to follow from the home page (0 = home page only)
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Maximum number of pages loaded per member
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Record an error instead of "Invalid" when a limit cuts the crawl short
    #[arg(long)]
    pub fail_on_limit: bool,

    /// Directory for evidence screenshots
    #[arg(long, default_value = DEFAULT_SCREENSHOT_DIR)]
    pub screenshots: PathBuf,

    /// Base URL of the webring's redirect and embed pages
    #[arg(long, default_value = DEFAULT_WEBRING_BASE)]
    pub webring_base: String,

    /// Use a WebDriver server (e.g. http://localhost:4444) instead of plain HTTP
    #[arg(long)]
    pub webdriver: Option<String>,
}
