//! Job domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unit of work dispatched to a worker
///
/// Structure shared between the queue service (persists) and the worker
/// (claims and updates). Historical records are retained for audit and are
/// never mutated after reaching a terminal state except by an explicit
/// operator reset on the queue side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub kind: JobKind,
    pub status: JobStatus,
    /// Type-specific payload. The canonical field name is `payload`; the
    /// deprecated `data` spelling is still accepted on input.
    #[serde(alias = "data")]
    pub payload: serde_json::Value,
    pub result: Option<JobResult>,
    pub requested_at: chrono::DateTime<chrono::Utc>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub worker_id: Option<String>,
}

/// Kind of work a job carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobKind {
    /// Render a batch of production items onto press sheets
    #[serde(rename = "MERGE_SHEET")]
    MergeSheet,
    /// Enumerate the layer tree of a template for field mapping
    #[serde(rename = "LOAD_LAYERS")]
    LoadLayers,
}

/// Job execution status
///
/// Transitions are monotonic: `Pending -> Processing -> Done | Error`.
/// A terminal job never moves back to `Pending` or `Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Processing,
    Done,
    Error,
}

impl JobStatus {
    /// Returns true if this status is terminal (Done or Error)
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }

    /// Returns true if moving to `next` is a legal monotonic transition
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        match self {
            JobStatus::Pending => matches!(next, JobStatus::Processing | JobStatus::Error),
            JobStatus::Processing => matches!(next, JobStatus::Done | JobStatus::Error),
            JobStatus::Done | JobStatus::Error => false,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "PENDING"),
            JobStatus::Processing => write!(f, "PROCESSING"),
            JobStatus::Done => write!(f, "DONE"),
            JobStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Result of a job execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub artifacts: Vec<String>,
    pub output_dir: Option<String>,
    pub error_message: Option<String>,
}

impl JobResult {
    /// Builds a success result carrying the exported artifact paths
    pub fn done(artifacts: Vec<String>, output_dir: String) -> Self {
        Self {
            artifacts,
            output_dir: Some(output_dir),
            error_message: None,
        }
    }

    /// Builds a failure result carrying a human-readable message
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            artifacts: Vec::new(),
            output_dir: None,
            error_message: Some(message.into()),
        }
    }
}
