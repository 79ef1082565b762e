//! Presswork Engine binary
//!
//! Headless entry point launched by the worker. Takes exactly one
//! argument, the payload file path, runs the automation, and writes
//! exactly one of a result or error file next to the payload before
//! exiting. The worker learns the outcome only through those files, so
//! the engine must produce one of them on every reachable failure path.

use anyhow::{Context, Result, anyhow};
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use presswork_core::dto::ipc::{self, ErrorFile, JobPayload, ResultFile};
use presswork_engine::automation;
use presswork_engine::export::RenderSpecBackend;

fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "presswork_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run() {
        error!("Engine failed: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let payload_arg = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("Usage: presswork-engine <payload-file>"))?;
    let payload_path = Path::new(&payload_arg);

    let payload = match load_payload(payload_path) {
        Ok(payload) => payload,
        Err(e) => {
            // The job id is still recoverable from the payload file name,
            // so the worker gets an error file instead of waiting out the
            // full timeout.
            report_unreadable_payload(payload_path, &e);
            return Err(e);
        }
    };

    let spool_dir = payload_path
        .parent()
        .ok_or_else(|| anyhow!("Payload path has no parent directory"))?;

    info!(
        job_id = %payload.job_id,
        kind = ?payload.kind,
        items = payload.items.len(),
        "Starting automation"
    );

    match automation::run(&payload, &RenderSpecBackend) {
        Ok(artifacts) => {
            info!(job_id = %payload.job_id, count = artifacts.len(), "Job done");
            let result = ResultFile::new(artifacts);
            if let Err(e) = write_json(&ipc::result_path(spool_dir, payload.job_id), &result) {
                // Fall back to an error file so the worker still gets an
                // outcome instead of waiting out the timeout.
                error!("Failed to write result file: {:#}", e);
                let fallback = ErrorFile::new(format!("Failed to record result: {e:#}"));
                write_json(&ipc::error_path(spool_dir, payload.job_id), &fallback)?;
            }
        }
        Err(e) => {
            error!(job_id = %payload.job_id, "Job failed: {:#}", e);
            let outcome = ErrorFile::new(format!("{e:#}"));
            write_json(&ipc::error_path(spool_dir, payload.job_id), &outcome)?;
        }
    }

    Ok(())
}

fn load_payload(path: &Path) -> Result<JobPayload> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read payload {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse payload {}", path.display()))
}

/// Answers an unreadable or unparsable payload with an error file, keyed
/// by the job id embedded in the payload file name. Best effort: a file
/// name that carries no job id leaves the worker to its timeout.
fn report_unreadable_payload(payload_path: &Path, err: &anyhow::Error) {
    let Some(job_id) = ipc::job_id_from_payload_path(payload_path) else {
        return;
    };
    let Some(spool_dir) = payload_path.parent() else {
        return;
    };

    let outcome = ErrorFile::new(format!("{err:#}"));
    if let Err(e) = write_json(&ipc::error_path(spool_dir, job_id), &outcome) {
        error!("Failed to write error file for unreadable payload: {:#}", e);
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize outcome")?;

    // Written to a sibling name and renamed into place so the polling
    // worker never observes a partial outcome file.
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move outcome into {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_unreadable_payload_still_yields_error_file() {
        let dir = tempfile::tempdir().unwrap();
        let job_id = Uuid::new_v4();
        let payload_path = ipc::payload_path(dir.path(), job_id);
        std::fs::write(&payload_path, "{ not json").unwrap();

        let err = load_payload(&payload_path).unwrap_err();
        report_unreadable_payload(&payload_path, &err);

        let text = std::fs::read_to_string(ipc::error_path(dir.path(), job_id)).unwrap();
        let file: ErrorFile = serde_json::from_str(&text).unwrap();
        assert!(file.message.contains("Failed to parse payload"));
    }

    #[test]
    fn test_outcome_write_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = ipc::result_path(dir.path(), Uuid::new_v4());

        write_json(&path, &ResultFile::new(vec![])).unwrap();

        assert!(path.is_file());
        // The rename consumes the temporary sibling.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
