//! File-based IPC channel with the document engine
//!
//! One `JobChannel` owns the spool files of a single job: the payload file
//! the engine reads, the generated launcher script, and the result/error
//! file the engine writes back. The worker has no other channel to the
//! engine than these files, so completion is detected by a bounded poll.
//! Cleanup removes every spool file regardless of outcome and is safe to
//! call more than once.

use anyhow::{Context, Result};
use presswork_core::dto::ipc::{self, ErrorFile, JobPayload, ResultFile};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// Terminal outcome of waiting for the document engine
#[derive(Debug)]
pub enum Outcome {
    /// The engine wrote a result file
    Completed(ResultFile),
    /// The engine wrote an error file
    Failed(ErrorFile),
    /// Neither file appeared within the timeout
    TimedOut,
}

/// Spool file set for one job, keyed by job id
pub struct JobChannel {
    spool_dir: PathBuf,
    job_id: Uuid,
}

impl JobChannel {
    pub fn new(spool_dir: &Path, job_id: Uuid) -> Self {
        Self {
            spool_dir: spool_dir.to_path_buf(),
            job_id,
        }
    }

    pub fn payload_path(&self) -> PathBuf {
        ipc::payload_path(&self.spool_dir, self.job_id)
    }

    pub fn launcher_path(&self) -> PathBuf {
        ipc::launcher_path(&self.spool_dir, self.job_id)
    }

    pub fn result_path(&self) -> PathBuf {
        ipc::result_path(&self.spool_dir, self.job_id)
    }

    pub fn error_path(&self) -> PathBuf {
        ipc::error_path(&self.spool_dir, self.job_id)
    }

    /// Serializes the job payload into the spool directory
    pub fn write_payload(&self, payload: &JobPayload) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.spool_dir).with_context(|| {
            format!("Failed to create spool directory {}", self.spool_dir.display())
        })?;

        let path = self.payload_path();
        let json =
            serde_json::to_string_pretty(payload).context("Failed to serialize job payload")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write payload file {}", path.display()))?;

        debug!("Wrote payload file {}", path.display());
        Ok(path)
    }

    /// Polls for a result or error file until one appears or the timeout
    /// elapses
    ///
    /// The presence of either file terminates the wait; exactly one of the
    /// two is ever written per job.
    pub async fn await_outcome(&self, poll_interval: Duration, timeout: Duration) -> Result<Outcome> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(result) = read_outcome::<ResultFile>(&self.result_path()) {
                return Ok(Outcome::Completed(result));
            }

            if let Some(error) = read_outcome::<ErrorFile>(&self.error_path()) {
                return Ok(Outcome::Failed(error));
            }

            if Instant::now() >= deadline {
                return Ok(Outcome::TimedOut);
            }

            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Removes every spool file of this job
    ///
    /// Runs on every exit path. Missing files are fine; other removal
    /// failures are logged and do not abort the polling loop.
    pub fn cleanup(&self) {
        for path in [
            self.payload_path(),
            self.launcher_path(),
            self.result_path(),
            self.error_path(),
        ] {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!("Removed spool file {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove spool file {}: {}", path.display(), e),
            }
        }
    }
}

/// Reads an outcome file, treating a missing or partially written file as
/// not present yet
///
/// The engine renames its outcome files into place, but a file observed
/// mid-write (older engine builds, foreign tooling in the spool) parses as
/// garbage. Aborting the wait on that would report a completing job as
/// failed, so the file is reread on the next poll; the timeout still
/// bounds the wait.
fn read_outcome<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Outcome file {} incomplete, rereading: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presswork_core::domain::job::JobKind;
    use presswork_core::dto::ipc::IpcStatus;

    fn channel(dir: &Path) -> JobChannel {
        JobChannel::new(dir, Uuid::new_v4())
    }

    fn payload(job_id: Uuid) -> JobPayload {
        JobPayload {
            job_id,
            kind: JobKind::MergeSheet,
            output_dir: PathBuf::from("/out"),
            items: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_result_file_terminates_wait() {
        let dir = tempfile::tempdir().unwrap();
        let ch = channel(dir.path());

        let result = ResultFile::new(vec![PathBuf::from("/out/a.pdf")]);
        std::fs::write(ch.result_path(), serde_json::to_string(&result).unwrap()).unwrap();

        let outcome = ch
            .await_outcome(Duration::from_millis(10), Duration::from_secs(1))
            .await
            .unwrap();

        match outcome {
            Outcome::Completed(r) => {
                assert_eq!(r.status, IpcStatus::Done);
                assert_eq!(r.artifacts.len(), 1);
            }
            other => panic!("expected Completed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_file_terminates_wait() {
        let dir = tempfile::tempdir().unwrap();
        let ch = channel(dir.path());

        let error = ErrorFile::new("template not found");
        std::fs::write(ch.error_path(), serde_json::to_string(&error).unwrap()).unwrap();

        let outcome = ch
            .await_outcome(Duration::from_millis(10), Duration::from_secs(1))
            .await
            .unwrap();

        match outcome {
            Outcome::Failed(e) => assert_eq!(e.message, "template not found"),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_partially_written_result_file_is_reread_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let ch = channel(dir.path());

        let full =
            serde_json::to_string(&ResultFile::new(vec![PathBuf::from("/out/a.pdf")])).unwrap();

        // A poll landing mid-write sees a truncated JSON snapshot. The
        // wait must keep polling until the complete file appears.
        std::fs::write(ch.result_path(), &full[..full.len() / 2]).unwrap();

        let result_path = ch.result_path();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            std::fs::write(result_path, full).unwrap();
        });

        let outcome = ch
            .await_outcome(Duration::from_millis(5), Duration::from_secs(2))
            .await
            .unwrap();
        writer.await.unwrap();

        match outcome {
            Outcome::Completed(r) => assert_eq!(r.artifacts.len(), 1),
            other => panic!("expected Completed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_when_no_file_appears() {
        let dir = tempfile::tempdir().unwrap();
        let ch = channel(dir.path());

        let outcome = ch
            .await_outcome(Duration::from_millis(5), Duration::from_millis(30))
            .await
            .unwrap();

        assert!(matches!(outcome, Outcome::TimedOut));
    }

    #[tokio::test]
    async fn test_cleanup_removes_all_spool_files_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let ch = channel(dir.path());

        ch.write_payload(&payload(Uuid::new_v4())).unwrap();
        std::fs::write(ch.launcher_path(), "#!/bin/sh\n").unwrap();
        std::fs::write(
            ch.result_path(),
            serde_json::to_string(&ResultFile::new(vec![])).unwrap(),
        )
        .unwrap();

        ch.cleanup();
        assert!(!ch.payload_path().exists());
        assert!(!ch.launcher_path().exists());
        assert!(!ch.result_path().exists());
        assert!(!ch.error_path().exists());

        // Second cleanup on an already-empty spool must not fail.
        ch.cleanup();
    }

    #[tokio::test]
    async fn test_distinct_jobs_use_distinct_spool_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = channel(dir.path());
        let b = channel(dir.path());
        assert_ne!(a.payload_path(), b.payload_path());
        assert_ne!(a.result_path(), b.result_path());
    }
}
