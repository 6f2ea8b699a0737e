// src/console.rs
// =============================================================================
// Everything the CLI prints for humans (and for scripts, with --json).
//
// Two kinds of output:
// - progress lines ("Loading registry...") while the run is going
// - the results at the end, as a table or as JSON
//
// With --json, stdout carries the JSON array and nothing else, so progress
// lines move to stderr and `webring-checker check --json | jq` just works.
// =============================================================================

use crate::report::{CrawlResult, Status};
use anyhow::Result;
use std::fmt;
use std::io::{self, Stderr, Stdout, Write};

pub struct Console<O: Write, E: Write> {
    out: O,
    err: E,
    json: bool,
}

impl Console<Stdout, Stderr> {
    pub fn new(json: bool) -> Self {
        Self::with_writers(io::stdout(), io::stderr(), json)
    }
}

impl<O: Write, E: Write> Console<O, E> {
    pub fn with_writers(out: O, err: E, json: bool) -> Self {
        Self { out, err, json }
    }

    // Use with format_args!: console.progress(format_args!("{} left", n))
    pub fn progress(&mut self, line: fmt::Arguments) -> io::Result<()> {
        if self.json {
            writeln!(self.err, "{}", line)
        } else {
            writeln!(self.out, "{}", line)
        }
    }

    /// Prints the results either as a table or JSON
    pub fn results(&mut self, results: &[CrawlResult]) -> Result<()> {
        if self.json {
            serde_json::to_writer_pretty(&mut self.out, results)?;
            writeln!(self.out)?;
        } else {
            self.table(results)?;
        }
        Ok(())
    }

    // Prints results as a human-readable table in the terminal
    fn table(&mut self, results: &[CrawlResult]) -> io::Result<()> {
        let out = &mut self.out;
        writeln!(out, "{:<25} {:<12} {:<60}", "NAME", "STATUS", "DETAIL")?;
        writeln!(out, "{}", "=".repeat(97))?;

        for result in results {
            let detail = match &result.status {
                Status::Valid => result.found_at.as_deref().unwrap_or(&result.url).to_string(),
                Status::Invalid => result.url.clone(),
                Status::Error(message) => message.clone(),
            };

            writeln!(
                out,
                "{:<25} {:<12} {:<60}",
                truncate(&result.name, 25),
                format_status(&result.status),
                truncate(&detail, 60)
            )?;
        }

        writeln!(out)?;

        let valid = results.iter().filter(|r| r.status.is_valid()).count();
        let errors = results.iter().filter(|r| r.status.is_error()).count();
        let invalid = results.len() - valid - errors;

        writeln!(out, "📊 Summary:")?;
        writeln!(out, "   ✅ Valid: {}", valid)?;
        writeln!(out, "   ❌ Invalid: {}", invalid)?;
        writeln!(out, "   ⚠️  Error: {}", errors)?;
        writeln!(out, "   📋 Total: {}", results.len())
    }
}

fn format_status(status: &Status) -> &'static str {
    match status {
        Status::Valid => "✅ VALID",
        Status::Invalid => "❌ INVALID",
        Status::Error(_) => "⚠️  ERROR",
    }
}

// Shortens text for a table column, on a char boundary
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
