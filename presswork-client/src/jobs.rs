//! Job-related API endpoints

use crate::QueueClient;
use crate::error::Result;
use presswork_core::domain::job::{Job, JobResult, JobStatus};
use presswork_core::dto::job::{ClaimNextRequest, UpdateStatusRequest};
use uuid::Uuid;

impl QueueClient {
    /// Claim the oldest pending job for this worker
    ///
    /// The queue service atomically hands out each pending job to at most
    /// one worker. Returns `None` when the backlog is empty (the service
    /// answers 204 No Content, older deployments 404).
    ///
    /// # Arguments
    /// * `worker_id` - The ID of the worker claiming the job
    pub async fn claim_next_pending(&self, worker_id: &str) -> Result<Option<Job>> {
        let url = format!("{}/api/jobs/claim-next", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ClaimNextRequest {
                worker_id: worker_id.to_string(),
            })
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }

        match self.handle_response(response).await {
            Ok(job) => Ok(Some(job)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Report a job status change to the queue service
    ///
    /// # Arguments
    /// * `job_id` - The ID of the job to update
    /// * `status` - The new status
    /// * `result` - The terminal result, when `status` is DONE or ERROR
    pub async fn update_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        result: Option<JobResult>,
    ) -> Result<()> {
        let url = format!("{}/api/jobs/{}/status", self.base_url, job_id);
        let response = self
            .client
            .put(&url)
            .json(&UpdateStatusRequest { status, result })
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}
