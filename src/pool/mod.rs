// src/pool/mod.rs
// =============================================================================
// Runs many member checks at the same time.
//
// How it works:
// - Members go into one shared work queue
// - N workers (tokio tasks) each own a fixed slot number 0..N
// - A worker pops a member, checks it in its own spawned task with its own
//   browser session, and hands the result to the result writer
// - The slot number decides where the worker's browser window goes on
//   screen, so concurrent crawls don't pile on top of each other
//
// A member that panics only loses its own result: the panic is caught at
// the task boundary and recorded as an error for that member.
//
// Rust concepts:
// - Arc: shared ownership across tasks (driver, probe, config, queue)
// - tokio::sync::Mutex: a lock that is fine to take inside async code
// - JoinHandle: awaiting a spawned task, Err if it panicked
// =============================================================================

mod grid;

pub use grid::WindowGrid;

use crate::browser::BrowserDriver;
use crate::checker::LivenessProbe;
use crate::config::CheckerConfig;
use crate::crawl::check_member;
use crate::registry::MemberEntry;
use crate::report::{CrawlResult, ResultSink};
use futures::future::join_all;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

type WorkQueue = Arc<Mutex<VecDeque<MemberEntry>>>;

/// Everything a worker needs, shared by all of them
pub struct WorkerPool {
    driver: Arc<dyn BrowserDriver>,
    probe: Arc<dyn LivenessProbe>,
    config: Arc<CheckerConfig>,
}

impl WorkerPool {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        probe: Arc<dyn LivenessProbe>,
        config: Arc<CheckerConfig>,
    ) -> Self {
        Self {
            driver,
            probe,
            config,
        }
    }

    /// Checks every member and submits one result per member to `sink`.
    ///
    /// Returns once all workers are done; results arrive in completion
    /// order, not registry order. Returns the number of members checked.
    pub async fn run(&self, members: Vec<MemberEntry>, sink: ResultSink) -> usize {
        if members.is_empty() {
            return 0;
        }

        let workers = self.config.workers.clamp(1, members.len());
        let queue: WorkQueue = Arc::new(Mutex::new(VecDeque::from(members)));
        tracing::info!(workers, "starting worker pool");

        let handles: Vec<_> = (0..workers)
            .map(|slot| {
                tokio::spawn(worker(
                    slot,
                    queue.clone(),
                    self.driver.clone(),
                    self.probe.clone(),
                    self.config.clone(),
                    sink.clone(),
                ))
            })
            .collect();

        let mut checked = 0;
        for (slot, joined) in join_all(handles).await.into_iter().enumerate() {
            match joined {
                Ok(count) => checked += count,
                Err(e) => tracing::error!(slot, error = %e, "worker stopped unexpectedly"),
            }
        }
        checked
    }
}

// One worker: keeps taking members until the queue is empty
async fn worker(
    slot: usize,
    queue: WorkQueue,
    driver: Arc<dyn BrowserDriver>,
    probe: Arc<dyn LivenessProbe>,
    config: Arc<CheckerConfig>,
    sink: ResultSink,
) -> usize {
    let window = config.grid.rect(slot);
    let mut checked = 0;

    loop {
        // The guard is dropped at the end of this statement
        let Some(member) = queue.lock().await.pop_front() else {
            break;
        };
        tracing::info!(slot, member = %member.name, url = %member.url, "checking member");

        // Own task per member so a panic stays contained
        let task = tokio::spawn({
            let member = member.clone();
            let driver = driver.clone();
            let probe = probe.clone();
            let config = config.clone();
            async move {
                check_member(&member, driver.as_ref(), probe.as_ref(), &config, Some(window)).await
            }
        });

        let result = match task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(slot, member = %member.name, error = %e, "member check crashed");
                CrawlResult::error(&member, format!("worker task failed: {}", e))
            }
        };
        checked += 1;

        if let Err(e) = sink.submit(result) {
            tracing::error!(slot, error = %e, "cannot hand over result, stopping worker");
            break;
        }
    }

    tracing::debug!(slot, checked, "worker finished");
    checked
}
