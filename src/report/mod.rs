// src/report/mod.rs
// =============================================================================
// This module owns the results of a run.
//
// Submodules:
// - result: the CrawlResult record and its Valid/Invalid/Error status
// - writer: the single task that persists results to disk as they arrive
//
// Workers never touch the output file. They send each finished result to
// the writer through a channel, and the writer rewrites the whole file.
// =============================================================================

mod result;
mod writer;

pub use result::{CrawlResult, Status};
pub use writer::{load_previous, spawn_writer, unrecorded_members, ResultSink};
