// src/report/writer.rs
// =============================================================================
// The single writer that persists results while a run is in progress.
//
// How it works:
// 1. spawn_writer() starts one tokio task that owns the result set
// 2. Workers hold a cheap ResultSink and submit() each finished result
// 3. The task appends the result and rewrites the whole output file
// 4. WriterHandle::finish() sends the Stop sentinel and waits for the
//    final flush
//
// Because only this task ever writes the file, concurrent workers can't
// interleave writes. Rewriting after every result means a crash loses at
// most the crawls that were still running.
//
// Each write goes to "<file>.tmp" first and is then renamed over the real
// file, so a reader never sees a half-written array.
// =============================================================================

use super::CrawlResult;
use crate::config::ResumeMode;
use crate::registry::MemberEntry;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

enum WriterMessage {
    Record(CrawlResult),
    Stop,
}

/// Producer side of the writer queue. Clone one per worker.
#[derive(Clone)]
pub struct ResultSink {
    tx: mpsc::UnboundedSender<WriterMessage>,
}

impl ResultSink {
    pub fn submit(&self, result: CrawlResult) -> Result<()> {
        self.tx
            .send(WriterMessage::Record(result))
            .map_err(|_| anyhow!("result writer has already stopped"))
    }
}

/// Owner side of the writer: stops it and collects the final result set.
pub struct WriterHandle {
    tx: mpsc::UnboundedSender<WriterMessage>,
    task: JoinHandle<Result<Vec<CrawlResult>>>,
}

impl WriterHandle {
    // Only call this once every worker is done, anything submitted after
    // the sentinel is dropped
    pub async fn finish(self) -> Result<Vec<CrawlResult>> {
        // The task may already be gone if every sink was dropped, that's fine
        let _ = self.tx.send(WriterMessage::Stop);
        self.task.await.context("result writer task panicked")?
    }
}

/// Starts the writer task.
///
/// `prior` is the result set of a previous run (possibly empty); new results
/// are appended after it.
pub fn spawn_writer(path: PathBuf, prior: Vec<CrawlResult>) -> (ResultSink, WriterHandle) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_writer(path, prior, rx));

    (ResultSink { tx: tx.clone() }, WriterHandle { tx, task })
}

async fn run_writer(
    path: PathBuf,
    mut results: Vec<CrawlResult>,
    mut rx: mpsc::UnboundedReceiver<WriterMessage>,
) -> Result<Vec<CrawlResult>> {
    while let Some(message) = rx.recv().await {
        match message {
            WriterMessage::Record(result) => {
                tracing::debug!(
                    member = %result.name,
                    status = %result.status,
                    "persisting result"
                );
                results.push(result);

                // Keep going on a failed write, the next result retries it
                // and the final flush below reports it
                if let Err(e) = write_results(&path, &results).await {
                    tracing::error!(
                        path = %path.display(),
                        error = %e,
                        "failed to persist results"
                    );
                }
            }
            WriterMessage::Stop => break,
        }
    }

    // Final flush, also creates the file when nothing new was recorded
    write_results(&path, &results)
        .await
        .with_context(|| format!("Failed to write results to {}", path.display()))?;

    tracing::info!(path = %path.display(), results = results.len(), "results saved");
    Ok(results)
}

// Serializes results the same way every time: 4-space indent, struct field
// order, no trailing newline
pub fn to_pretty_json(results: &[CrawlResult]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    results.serialize(&mut serializer)?;
    Ok(buffer)
}

async fn write_results(path: &Path, results: &[CrawlResult]) -> Result<()> {
    let bytes = to_pretty_json(results)?;

    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("Output path {} has no file name", path.display()))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = tokio::fs::File::create(&temp_path).await?;
    file.write_all(&bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&temp_path, path).await?;
    Ok(())
}

/// Loads the result set of a previous run so it can be resumed.
///
/// A missing file is an empty result set. So is a file that doesn't parse,
/// it gets overwritten by this run.
pub async fn load_previous(path: &Path) -> Result<Vec<CrawlResult>> {
    let body = match tokio::fs::read_to_string(path).await {
        Ok(body) => body,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to read previous results {}", path.display()))
        }
    };

    match serde_json::from_str(&body) {
        Ok(results) => Ok(results),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "previous results unreadable, starting fresh"
            );
            Ok(Vec::new())
        }
    }
}

/// Members still to check, given what a previous run recorded.
///
/// With `ResumeMode::Append` everything is checked again and recorded twice.
pub fn unrecorded_members(
    members: Vec<MemberEntry>,
    previous: &[CrawlResult],
    mode: ResumeMode,
) -> Vec<MemberEntry> {
    match mode {
        ResumeMode::Append => members,
        ResumeMode::SkipRecorded => {
            let recorded: HashSet<&str> = previous.iter().map(|r| r.name.as_str()).collect();
            members
                .into_iter()
                .filter(|member| !recorded.contains(member.name.as_str()))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Status;
    use std::time::Duration;

    fn result(name: &str, status: Status) -> CrawlResult {
        CrawlResult {
            name: name.to_string(),
            url: format!("https://{}.example", name),
            status,
            found_at: None,
        }
    }

    #[test]
    fn test_pretty_json_layout() {
        let bytes = to_pretty_json(&[result("alice", Status::Valid)]).unwrap();
        let expected = concat!(
            "[\n",
            "    {\n",
            "        \"name\": \"alice\",\n",
            "        \"url\": \"https://alice.example\",\n",
            "        \"status\": \"Valid\"\n",
            "    }\n",
            "]"
        );
        assert_eq!(String::from_utf8(bytes).unwrap(), expected);
    }

    #[tokio::test]
    async fn test_writing_twice_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let results = vec![
            result("alice", Status::Valid),
            result("bob", Status::Error("404".to_string())),
        ];

        write_results(&path, &results).await.unwrap();
        let first = std::fs::read(&path).unwrap();
        write_results(&path, &results).await.unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
        assert!(!dir.path().join("results.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_every_result_is_persisted_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let (sink, handle) = spawn_writer(path.clone(), Vec::new());

        sink.submit(result("alice", Status::Invalid)).unwrap();

        // The file shows up without waiting for the end of the run
        let mut on_disk = Vec::new();
        for _ in 0..100 {
            on_disk = load_previous(&path).await.unwrap();
            if !on_disk.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(on_disk, vec![result("alice", Status::Invalid)]);

        handle.finish().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_submitters_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let (sink, handle) = spawn_writer(path.clone(), Vec::new());

        let mut tasks = Vec::new();
        for i in 0..12u64 {
            let sink = sink.clone();
            tasks.push(tokio::spawn(async move {
                // Finish in a scrambled order
                tokio::time::sleep(Duration::from_millis((i * 7) % 5)).await;
                let member = MemberEntry {
                    name: format!("member-{}", i),
                    url: format!("https://m{}.example", i),
                };
                sink.submit(CrawlResult::invalid(&member)).unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let finished = handle.finish().await.unwrap();
        assert_eq!(finished.len(), 12);

        let mut names: Vec<String> = load_previous(&path)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        names.sort();
        let mut expected: Vec<String> = (0..12).map(|i| format!("member-{}", i)).collect();
        expected.sort();
        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn test_prior_results_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let prior = vec![result("alice", Status::Valid)];
        let (sink, handle) = spawn_writer(path.clone(), prior);

        sink.submit(result("bob", Status::Invalid)).unwrap();
        let finished = handle.finish().await.unwrap();

        assert_eq!(finished.len(), 2);
        assert_eq!(finished[0].name, "alice");
        assert_eq!(load_previous(&path).await.unwrap(), finished);
    }

    #[tokio::test]
    async fn test_missing_or_corrupt_previous_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        assert!(load_previous(&path).await.unwrap().is_empty());

        std::fs::write(&path, "[{\"name\": ").unwrap();
        assert!(load_previous(&path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_after_finish_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (sink, handle) = spawn_writer(dir.path().join("out.json"), Vec::new());
        handle.finish().await.unwrap();

        assert!(sink.submit(result("late", Status::Invalid)).is_err());
    }

    #[test]
    fn test_resume_skips_recorded_members() {
        let members: Vec<MemberEntry> = ["alice", "bob"]
            .iter()
            .map(|name| MemberEntry {
                name: name.to_string(),
                url: format!("https://{}.example", name),
            })
            .collect();
        let previous = vec![result("alice", Status::Invalid)];

        let pending = unrecorded_members(members.clone(), &previous, ResumeMode::SkipRecorded);
        assert_eq!(pending, vec![members[1].clone()]);

        let pending = unrecorded_members(members.clone(), &previous, ResumeMode::Append);
        assert_eq!(pending, members);
    }
}
