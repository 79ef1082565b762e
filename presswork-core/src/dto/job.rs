//! Job DTOs for queue communication

use serde::{Deserialize, Serialize};

use crate::domain::item::ProductionItem;
use crate::domain::job::{JobResult, JobStatus};

/// Status update from worker to queue service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: JobStatus,
    pub result: Option<JobResult>,
}

/// Request sent by a worker to claim the oldest pending job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimNextRequest {
    pub worker_id: String,
}

/// Payload shape of a `MERGE_SHEET` job
///
/// Created by the dashboard when an operator commits a print batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeSheetRequest {
    pub items: Vec<ProductionItem>,
}

/// Payload shape of a `LOAD_LAYERS` job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadLayersRequest {
    pub template_key: String,
}
