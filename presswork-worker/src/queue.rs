//! Queue service seam
//!
//! The poller talks to the queue service through the `QueueApi` trait so
//! tests can drive it with an in-memory queue. The production
//! implementation delegates to the HTTP client crate.

use anyhow::{Context, Result};
use async_trait::async_trait;
use presswork_client::QueueClient;
use presswork_core::domain::job::{Job, JobResult, JobStatus};
use presswork_core::dto::worker::Heartbeat;
use uuid::Uuid;

/// Fallible remote operations against the queue service
///
/// Every call may fail transiently; callers log failures and rely on the
/// next polling tick to retry naturally. Nothing here is retried inline.
#[async_trait]
pub trait QueueApi: Send + Sync {
    /// Claims the oldest pending job, or `None` when the backlog is empty
    async fn claim_next_pending(&self, worker_id: &str) -> Result<Option<Job>>;

    /// Reports a status change, with the terminal result when applicable
    async fn update_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        result: Option<JobResult>,
    ) -> Result<()>;

    /// Emits the periodic liveness signal
    async fn send_heartbeat(&self, heartbeat: &Heartbeat) -> Result<()>;
}

#[async_trait]
impl QueueApi for QueueClient {
    async fn claim_next_pending(&self, worker_id: &str) -> Result<Option<Job>> {
        QueueClient::claim_next_pending(self, worker_id)
            .await
            .context("Failed to claim next pending job")
    }

    async fn update_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        result: Option<JobResult>,
    ) -> Result<()> {
        QueueClient::update_status(self, job_id, status, result)
            .await
            .context("Failed to update job status")
    }

    async fn send_heartbeat(&self, heartbeat: &Heartbeat) -> Result<()> {
        QueueClient::send_heartbeat(self, heartbeat)
            .await
            .context("Failed to send heartbeat")
    }
}

/// Builds the liveness signal for this worker build
pub fn make_heartbeat(worker_id: &str, busy: bool) -> Heartbeat {
    Heartbeat {
        worker_id: worker_id.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        os: std::env::consts::OS.to_string(),
        busy,
        timestamp: chrono::Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_carries_identity_and_state() {
        let hb = make_heartbeat("press-worker-01", true);
        assert_eq!(hb.worker_id, "press-worker-01");
        assert_eq!(hb.version, env!("CARGO_PKG_VERSION"));
        assert!(!hb.os.is_empty());
        assert!(hb.busy);
    }
}
