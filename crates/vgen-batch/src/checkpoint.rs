//! Subject checkpoint log pair.
//!
//! `tasks.txt` is the static pending list, read once per run in order.
//! `completed.txt` is append-only; it may contain duplicate lines and is
//! always read back as a set. Appends go through a single dedicated
//! writer task so concurrent workers can never interleave or truncate
//! lines.

use std::collections::HashSet;
use std::path::Path;

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::error;

use crate::error::{BatchError, BatchResult};

/// Load the pending subject list, order-preserving, blank lines skipped.
pub async fn load_subjects(path: impl AsRef<Path>) -> BatchResult<Vec<String>> {
    let content = fs::read_to_string(path.as_ref()).await?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

/// Load the completed set. A missing file means nothing is completed.
pub async fn load_completed(path: impl AsRef<Path>) -> BatchResult<HashSet<String>> {
    match fs::read_to_string(path.as_ref()).await {
        Ok(content) => Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashSet::new()),
        Err(e) => Err(e.into()),
    }
}

/// Cloneable handle workers use to report completions.
#[derive(Clone)]
pub struct CompletedMarker {
    tx: mpsc::Sender<String>,
}

impl CompletedMarker {
    /// Record one completion line.
    pub async fn mark(&self, subject: &str) -> BatchResult<()> {
        self.tx
            .send(subject.to_string())
            .await
            .map_err(|_| BatchError::LogClosed)
    }
}

/// Append-only completion log with a single writer task.
pub struct CompletedLog {
    tx: mpsc::Sender<String>,
    writer: JoinHandle<()>,
}

impl CompletedLog {
    /// Open (creating if needed) the log and spawn its writer.
    pub async fn open(path: impl AsRef<Path>) -> BatchResult<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .await?;

        let (tx, mut rx) = mpsc::channel::<String>(64);
        let writer = tokio::spawn(async move {
            while let Some(subject) = rx.recv().await {
                let line = format!("{subject}\n");
                // Flush per line so a crash loses at most the line in flight
                if let Err(e) = file.write_all(line.as_bytes()).await {
                    error!("failed to append to completed log: {e}");
                    continue;
                }
                if let Err(e) = file.flush().await {
                    error!("failed to flush completed log: {e}");
                }
            }
        });

        Ok(Self { tx, writer })
    }

    /// Handle for workers to report completions through.
    pub fn marker(&self) -> CompletedMarker {
        CompletedMarker {
            tx: self.tx.clone(),
        }
    }

    /// Close the channel and wait for every queued line to be written.
    ///
    /// All `CompletedMarker` clones must be dropped first or this waits
    /// for them.
    pub async fn close(self) {
        drop(self.tx);
        if let Err(e) = self.writer.await {
            error!("completed log writer task failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_subjects_preserves_order_and_skips_blanks() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tasks.txt");
        fs::write(&path, "first\n\n  second  \nthird\n").await.unwrap();

        let subjects = load_subjects(&path).await.unwrap();
        assert_eq!(subjects, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_load_completed_dedupes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("completed.txt");
        fs::write(&path, "a\nb\na\n").await.unwrap();

        let completed = load_completed(&path).await.unwrap();
        assert_eq!(completed.len(), 2);
        assert!(completed.contains("a"));
    }

    #[tokio::test]
    async fn test_load_completed_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let completed = load_completed(tmp.path().join("none.txt")).await.unwrap();
        assert!(completed.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_marks_land_as_whole_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("completed.txt");
        let log = CompletedLog::open(&path).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..20 {
            let marker = log.marker();
            handles.push(tokio::spawn(async move {
                marker.mark(&format!("subject-{i}")).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        log.close().await;

        let completed = load_completed(&path).await.unwrap();
        assert_eq!(completed.len(), 20);
    }

    #[tokio::test]
    async fn test_open_appends_to_existing_log() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("completed.txt");
        fs::write(&path, "old\n").await.unwrap();

        let log = CompletedLog::open(&path).await.unwrap();
        log.marker().mark("new").await.unwrap();
        log.close().await;

        let completed = load_completed(&path).await.unwrap();
        assert!(completed.contains("old"));
        assert!(completed.contains("new"));
    }
}
