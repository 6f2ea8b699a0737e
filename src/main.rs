// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (RUST_LOG controls verbosity, logs go to stderr)
// 2. Parse command-line arguments using clap
// 3. Dispatch to the appropriate subcommand handler
// 4. Print the results
// 5. Exit with proper code (0 = run completed, 2 = could not start)
//
// A member failing its check is NOT a failure of the run: it's recorded in
// the results and the exit code stays 0.
// =============================================================================

// Module declarations - tells Rust about our other source files
mod browser; // src/browser/ - page loading (static HTML or WebDriver)
mod checker; // src/checker/ - evidence detection, link harvesting, liveness
mod cli; // src/cli.rs - command-line parsing
mod config; // src/config.rs - runtime configuration
mod console; // src/console.rs - progress lines and the results table
mod crawl; // src/crawl/ - crawling one member's site
mod pool; // src/pool/ - running many members in parallel
mod registry; // src/registry/ - loading the member list
mod report; // src/report/ - results and their persistence

use anyhow::Result;
use browser::{BrowserDriver, StaticHtmlDriver, WebDriverDriver};
use checker::HttpProbe;
use clap::Parser;
use cli::{Cli, Commands, CrawlArgs};
use config::{CheckerConfig, ResumeMode};
use console::Console;
use crawl::check_member;
use pool::WorkerPool;
use registry::MemberEntry;
use std::io::{Stderr, Stdout};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // Startup failures: bad registry, unusable output file...
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so `--json` output on stdout stays clean
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("webring_checker=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            registry,
            output,
            timestamped,
            workers,
            recrawl,
            json,
            crawl,
        } => {
            let output = if timestamped {
                PathBuf::from(
                    chrono::Local::now()
                        .format("results_%Y-%m-%d_%H-%M.json")
                        .to_string(),
                )
            } else {
                output
            };

            let config = CheckerConfig {
                workers,
                output,
                resume: if recrawl {
                    ResumeMode::Append
                } else {
                    ResumeMode::SkipRecorded
                },
                ..CheckerConfig::from_crawl_args(&crawl)
            };

            handle_check(&registry, config, &crawl, &mut Console::new(json)).await
        }
        Commands::Site {
            name,
            url,
            json,
            crawl,
        } => handle_site(MemberEntry { name, url }, &crawl, &mut Console::new(json)).await,
    }
}

type StdConsole = Console<Stdout, Stderr>;

// Picks the page loader
fn build_driver(crawl: &CrawlArgs, console: &mut StdConsole) -> Result<Arc<dyn BrowserDriver>> {
    let driver: Arc<dyn BrowserDriver> = match &crawl.webdriver {
        Some(endpoint) => {
            console.progress(format_args!("🌐 Using WebDriver at {}", endpoint))?;
            Arc::new(WebDriverDriver::new(endpoint)?)
        }
        None => Arc::new(StaticHtmlDriver::new()?),
    };
    Ok(driver)
}

// Handles the 'check' subcommand
async fn handle_check(
    registry_source: &str,
    config: CheckerConfig,
    crawl: &CrawlArgs,
    console: &mut StdConsole,
) -> Result<i32> {
    console.progress(format_args!("🔍 Loading registry: {}", registry_source))?;
    let members = registry::load_registry(registry_source).await?;

    // Resume from whatever a previous run left behind
    let previous = report::load_previous(&config.output).await?;
    let total = members.len();
    let pending = report::unrecorded_members(members, &previous, config.resume);

    console.progress(format_args!("📋 {} member(s) in the registry", total))?;
    if !previous.is_empty() {
        console.progress(format_args!(
            "♻️  {} result(s) from a previous run in {}, {} member(s) left to check",
            previous.len(),
            config.output.display(),
            pending.len()
        ))?;
    }
    console.progress(format_args!("🔗 Looking for links back to {}", config.webring.base()))?;
    console.progress(format_args!(
        "🚀 Checking with {} worker(s), max depth {}\n",
        config.workers, config.limits.max_depth
    ))?;

    // Built before the writer starts: a bad --webdriver URL stops us here
    let driver = build_driver(crawl, console)?;
    let probe = Arc::new(HttpProbe::new()?);

    let (sink, writer) = report::spawn_writer(config.output.clone(), previous);
    let output = config.output.clone();
    let pool = WorkerPool::new(driver, probe, Arc::new(config));

    let checked = pool.run(pending, sink).await;

    // Every worker is done, now the writer can stop
    let results = writer.finish().await?;

    console.progress(format_args!(
        "\n✅ Checked {} member(s), results saved to {}\n",
        checked,
        output.display()
    ))?;
    console.results(&results)?;

    Ok(0)
}

// Handles the 'site' subcommand
async fn handle_site(
    member: MemberEntry,
    crawl: &CrawlArgs,
    console: &mut StdConsole,
) -> Result<i32> {
    console.progress(format_args!("🔍 Checking {} ({})", member.name, member.url))?;

    let config = CheckerConfig::from_crawl_args(crawl);
    let driver = build_driver(crawl, console)?;
    let probe = HttpProbe::new()?;

    let result = check_member(&member, driver.as_ref(), &probe, &config, None).await;
    console.results(&[result])?;

    Ok(0)
}
