//! Job poller
//!
//! Drives the per-tick state machine:
//! `IDLE -> CLAIMING -> DISPATCHED -> AWAITING_RESULT -> REPORTING -> IDLE`.
//! A tick that arrives while a job is in flight emits the liveness signal
//! and returns; jobs never overlap. Queue failures are logged and the next
//! tick retries the underlying operation naturally.

use anyhow::Result;
use presswork_core::domain::job::JobStatus;
use std::sync::{Arc, Mutex};
use tokio::time;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::execution;
use crate::queue::{QueueApi, make_heartbeat};

/// Explicit in-flight state held by the poller instance
///
/// Kept as instance state (not an ambient flag) so multiple worker
/// instances can coexist in one process under test without interference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Processing { job_id: Uuid },
}

/// Polling worker that claims and dispatches one job at a time
pub struct JobPoller {
    config: Config,
    queue: Arc<dyn QueueApi>,
    state: Arc<Mutex<WorkerState>>,
}

impl JobPoller {
    /// Creates a new job poller
    pub fn new(config: Config, queue: Arc<dyn QueueApi>) -> Self {
        Self {
            config,
            queue,
            state: Arc::new(Mutex::new(WorkerState::Idle)),
        }
    }

    /// Current worker state
    pub fn state(&self) -> WorkerState {
        *self.state.lock().unwrap()
    }

    /// Starts the polling loop
    pub async fn run(&self) -> Result<()> {
        info!(
            "Starting job poller (interval: {:?}, timeout: {:?})",
            self.config.poll_interval, self.config.job_timeout
        );

        let mut interval = time::interval(self.config.poll_interval);

        loop {
            interval.tick().await;
            // The dispatch task owns the in-flight job; run() never awaits it.
            let _ = self.tick().await;
        }
    }

    /// Performs a single polling tick
    ///
    /// Returns the dispatch task handle when a job was claimed, so tests
    /// can await completion deterministically.
    pub async fn tick(&self) -> Option<tokio::task::JoinHandle<()>> {
        if let WorkerState::Processing { job_id } = self.state() {
            debug!("Job {} still in flight, tick is a no-op", job_id);
            self.heartbeat(true).await;
            return None;
        }

        let job = match self.queue.claim_next_pending(&self.config.worker_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                debug!("No pending jobs");
                self.heartbeat(false).await;
                return None;
            }
            Err(e) => {
                // Transient queue I/O: swallowed, the next tick retries.
                error!("Failed to poll queue: {:#}", e);
                self.heartbeat(false).await;
                return None;
            }
        };

        info!("Claimed job {} ({:?})", job.id, job.kind);

        // Mark PROCESSING immediately, at-least-once: a crash after this
        // point leaves the job stuck until an operator resets it on the
        // queue side. A failed report is logged and the job still runs.
        if let Err(e) = self
            .queue
            .update_status(job.id, JobStatus::Processing, None)
            .await
        {
            warn!("Failed to mark job {} as PROCESSING: {:#}", job.id, e);
        }

        *self.state.lock().unwrap() = WorkerState::Processing { job_id: job.id };
        self.heartbeat(true).await;

        let config = self.config.clone();
        let queue = Arc::clone(&self.queue);
        let state = Arc::clone(&self.state);

        Some(tokio::spawn(async move {
            execution::run_job(job, config, queue).await;
            *state.lock().unwrap() = WorkerState::Idle;
        }))
    }

    /// Emits the liveness signal; failures are logged, never fatal
    async fn heartbeat(&self, busy: bool) {
        let heartbeat = make_heartbeat(&self.config.worker_id, busy);
        if let Err(e) = self.queue.send_heartbeat(&heartbeat).await {
            warn!("Failed to send heartbeat: {:#}", e);
        }
    }
}
